//! Performance report combining a contingency table with named measures.
//!
//! The standard columns come first, in a fixed order; every other stored
//! measure follows as a `name` / `name-std` pair in first-insertion order.
//! [`PerformanceReport::headers`] and [`PerformanceReport::data_line`]
//! always produce the same number of fields.

use core::fmt;

use foldwise_core::{Scored, Summarizable};

use crate::contingency::ContingencyTable;
use crate::measure::EvaluationMeasure;

/// Store name of the per-fold F1 samples.
pub const F1_MEASURE: &str = "F-1";
/// Store name of the ROC AUC samples.
pub const AUC_MEASURE: &str = "AUC";

const STANDARD_HEADERS: [&str; 11] = [
    "accuracy",
    "precision",
    "recall",
    "f-1",
    "f-1_STD_DEV",
    "specificity",
    "sensitivity",
    "PositivePredictiveValue",
    "NegativePredictiveValue",
    "ROC_AUC",
    "AUC_STD_DEV",
];

/// Outcome of one cross-validation fold.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FoldOutcome {
    /// Repeat number (0-indexed).
    pub repeat: usize,
    /// Fold number within the repeat (0-indexed).
    pub fold: usize,
    /// Number of training instances.
    pub n_train: usize,
    /// Number of held-out instances.
    pub n_test: usize,
    /// Predictions of this fold only.
    pub table: ContingencyTable,
}

impl Scored for FoldOutcome {
    /// F1 of the fold's own predictions.
    fn score(&self) -> f64 {
        self.table.f1_measure()
    }
}

/// Aggregated result of an evaluation run.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PerformanceReport {
    /// Pooled predictions of the whole run.
    pub table: ContingencyTable,
    /// Per-fold / per-repeat samples.
    pub measures: EvaluationMeasure,
    /// Per-fold breakdown (empty for single-table modes).
    pub folds: Vec<FoldOutcome>,
}

impl PerformanceReport {
    pub fn new(table: ContingencyTable, measures: EvaluationMeasure) -> Self {
        Self {
            table,
            measures,
            folds: Vec::new(),
        }
    }

    pub fn accuracy(&self) -> f64 {
        self.table.accuracy()
    }

    pub fn error_rate(&self) -> f64 {
        self.table.error_rate()
    }

    pub fn precision(&self) -> f64 {
        self.table.precision()
    }

    pub fn recall(&self) -> f64 {
        self.table.recall()
    }

    pub fn sensitivity(&self) -> f64 {
        self.table.sensitivity()
    }

    pub fn specificity(&self) -> f64 {
        self.table.specificity()
    }

    pub fn false_positive_rate(&self) -> f64 {
        self.table.false_positive_rate()
    }

    pub fn false_negative_rate(&self) -> f64 {
        self.table.false_negative_rate()
    }

    pub fn positive_predictive_value(&self) -> f64 {
        self.table.positive_predictive_value()
    }

    pub fn negative_predictive_value(&self) -> f64 {
        self.table.negative_predictive_value()
    }

    /// F1 of the pooled predictions.
    pub fn f1(&self) -> f64 {
        self.table.f1_measure()
    }

    /// Standard deviation of the per-fold F1 samples.
    pub fn f1_stddev(&self) -> f64 {
        self.measures.stddev(F1_MEASURE)
    }

    /// Mean of the ROC AUC samples.
    pub fn roc_auc(&self) -> f64 {
        self.measures.average(AUC_MEASURE)
    }

    pub fn auc_stddev(&self) -> f64 {
        self.measures.stddev(AUC_MEASURE)
    }

    /// Mean of an arbitrary named measure.
    pub fn average(&self, name: &str) -> f64 {
        self.measures.average(name)
    }

    /// Standard deviation of an arbitrary named measure.
    pub fn stddev(&self, name: &str) -> f64 {
        self.measures.stddev(name)
    }

    /// Extra measures reported after the standard columns.
    pub fn extra_measures(&self) -> impl Iterator<Item = &str> {
        self.measures
            .measure_names()
            .filter(|n| *n != F1_MEASURE && *n != AUC_MEASURE)
    }

    /// Header row for the given extra measure names.
    pub fn headers_for<'a, I>(delimiter: char, extra: I) -> String
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut fields: Vec<String> = STANDARD_HEADERS.iter().map(|h| h.to_string()).collect();
        for name in extra {
            fields.push(name.to_string());
            fields.push(format!("{}-std", name));
        }
        fields.join(&delimiter.to_string())
    }

    /// Header row matching [`data_line`](Self::data_line).
    pub fn headers(&self, delimiter: char) -> String {
        Self::headers_for(delimiter, self.extra_measures())
    }

    /// Values in the order of [`headers`](Self::headers).
    pub fn data_line(&self, delimiter: char) -> String {
        let mut values = vec![
            self.accuracy(),
            self.precision(),
            self.recall(),
            self.f1(),
            self.f1_stddev(),
            self.specificity(),
            self.sensitivity(),
            self.positive_predictive_value(),
            self.negative_predictive_value(),
            self.roc_auc(),
            self.auc_stddev(),
        ];
        for name in self.extra_measures() {
            values.push(self.measures.average(name));
            values.push(self.measures.stddev(name));
        }
        values
            .into_iter()
            .map(format_value)
            .collect::<Vec<_>>()
            .join(&delimiter.to_string())
    }
}

impl fmt::Display for PerformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "accuracy: {} precision: {} recall: {} f-1: {} f-1_STD_DEV: {} \
             specificity: {} sensitivity: {} PositivePredictiveValue: {} \
             NegativePredictiveValue: {} ROC_AUC: {} AUC_STD_DEV: {}",
            format_value(self.accuracy()),
            format_value(self.precision()),
            format_value(self.recall()),
            format_value(self.f1()),
            format_value(self.f1_stddev()),
            format_value(self.specificity()),
            format_value(self.sensitivity()),
            format_value(self.positive_predictive_value()),
            format_value(self.negative_predictive_value()),
            format_value(self.roc_auc()),
            format_value(self.auc_stddev()),
        )?;
        for name in self.extra_measures() {
            write!(
                f,
                " {}: {} {}-std: {}",
                name,
                format_value(self.measures.average(name)),
                name,
                format_value(self.measures.stddev(name)),
            )?;
        }
        Ok(())
    }
}

impl Summarizable for PerformanceReport {
    fn summary(&self) -> String {
        format!(
            "n={}, accuracy={}, f-1={}, auc={}",
            self.table.total(),
            format_value(self.accuracy()),
            format_value(self.f1()),
            format_value(self.roc_auc()),
        )
    }
}

/// A report together with its rendered header and data rows.
#[derive(Debug, Clone)]
pub struct TabularReport {
    pub report: PerformanceReport,
    pub delimiter: char,
    pub headers: String,
    pub data_line: String,
}

impl TabularReport {
    /// Render `report` with `delimiter`.
    pub fn new(report: PerformanceReport, delimiter: char) -> Self {
        let headers = report.headers(delimiter);
        let data_line = report.data_line(delimiter);
        Self {
            report,
            delimiter,
            headers,
            data_line,
        }
    }
}

impl fmt::Display for TabularReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.headers)?;
        write!(f, "{}", self.data_line)
    }
}

/// At most two fraction digits, trailing zeros trimmed; `NaN` stays `NaN`.
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let s = format!("{:.2}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> PerformanceReport {
        let mut measures = EvaluationMeasure::new();
        for v in [80.0, 90.0, 100.0] {
            measures.add_value(F1_MEASURE, v);
        }
        measures.add_value("mat", 0.5);
        measures.add_value(AUC_MEASURE, 0.75);
        measures.add_value("auc", 0.8);
        PerformanceReport::new(ContingencyTable::from_counts(2, 18, 182, 1), measures)
    }

    #[test]
    fn headers_and_data_line_align() {
        let report = sample_report();
        let headers = report.headers('\t');
        let data = report.data_line('\t');
        assert_eq!(headers.split('\t').count(), data.split('\t').count());
        assert_eq!(headers.split('\t').count(), 11 + 4);
        assert!(headers.ends_with("mat\tmat-std\tauc\tauc-std"));
    }

    #[test]
    fn data_line_values() {
        let report = sample_report();
        let data = report.data_line(',');
        let fields: Vec<&str> = data.split(',').collect();
        assert_eq!(fields[5], "91");
        assert_eq!(fields[6], "66.67");
        assert_eq!(fields[9], "0.75");
        assert_eq!(fields[10], "NaN");
        assert_eq!(fields[11], "0.5");
        assert_eq!(fields[12], "NaN");
    }

    #[test]
    fn empty_report_is_all_nan() {
        let report = PerformanceReport::default();
        let data = report.data_line(',');
        assert!(data.split(',').all(|f| f == "NaN"));
        assert_eq!(report.headers(',').split(',').count(), 11);
    }

    #[test]
    fn display_lists_extra_measures() {
        let text = sample_report().to_string();
        assert!(text.starts_with("accuracy: "));
        assert!(text.contains("specificity: 91"));
        assert!(text.contains(" mat: 0.5 mat-std: NaN"));
    }

    #[test]
    fn formatting() {
        assert_eq!(format_value(100.0), "100");
        assert_eq!(format_value(200.0 / 3.0), "66.67");
        assert_eq!(format_value(0.1), "0.1");
        assert_eq!(format_value(-0.001), "0");
        assert_eq!(format_value(f64::NAN), "NaN");
    }

    #[test]
    fn tabular_rendering_uses_delimiter() {
        let tab = TabularReport::new(sample_report(), ';');
        assert_eq!(tab.headers, tab.report.headers(';'));
        assert!(tab.headers.starts_with("accuracy;precision;"));
        assert_eq!(tab.data_line.split(';').count(), tab.headers.split(';').count());
        let text = tab.to_string();
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn fold_score_is_micro_f1() {
        let fold = FoldOutcome {
            repeat: 0,
            fold: 1,
            n_train: 8,
            n_test: 2,
            table: ContingencyTable::from_counts(1, 0, 1, 0),
        };
        assert!((fold.score() - 100.0).abs() < 1e-12);
    }
}
