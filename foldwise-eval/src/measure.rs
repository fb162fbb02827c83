//! Named performance-measure samples collected across folds and repeats.

use tracing::{debug, trace};

use crate::contingency::ContingencyTable;

/// Store mapping a measure name to its ordered samples.
///
/// Names are case-sensitive and kept in first-insertion order. `NaN`
/// samples are never stored.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvaluationMeasure {
    measures: Vec<(String, Vec<f64>)>,
}

impl EvaluationMeasure {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `value` to `name`, registering the name on first use.
    ///
    /// `NaN` contributions are ignored.
    pub fn add_value(&mut self, name: &str, value: f64) {
        let samples = self.entry(name);
        if value.is_nan() {
            debug!(measure = name, "ignoring NaN contribution");
            return;
        }
        samples.push(value);
    }

    /// Register `name` and append the value if one is available.
    pub fn record(&mut self, name: &str, value: Option<f64>) {
        match value {
            Some(v) => self.add_value(name, v),
            None => {
                self.entry(name);
                debug!(measure = name, "no value available");
            }
        }
    }

    /// Samples recorded for `name`, if it was ever registered.
    pub fn values(&self, name: &str) -> Option<&[f64]> {
        self.measures
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    /// Arithmetic mean of the samples, or `NaN` when there are none.
    pub fn average(&self, name: &str) -> f64 {
        let values = match self.values(name) {
            Some(v) if !v.is_empty() => v,
            _ => return f64::NAN,
        };
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        trace!(
            measure = name,
            n = values.len(),
            mean,
            "averaged measure samples"
        );
        mean
    }

    /// Population standard deviation, or `NaN` with fewer than 3 samples.
    pub fn stddev(&self, name: &str) -> f64 {
        let values = match self.values(name) {
            Some(v) if v.len() >= 3 => v,
            _ => return f64::NAN,
        };
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        var.sqrt()
    }

    /// Registered names in first-insertion order.
    pub fn measure_names(&self) -> impl Iterator<Item = &str> {
        self.measures.iter().map(|(n, _)| n.as_str())
    }

    /// Largest number of samples held by any single measure.
    pub fn max_num_values(&self) -> usize {
        self.measures.iter().map(|(_, v)| v.len()).max().unwrap_or(0)
    }

    fn entry(&mut self, name: &str) -> &mut Vec<f64> {
        let idx = match self.measures.iter().position(|(n, _)| n == name) {
            Some(idx) => idx,
            None => {
                self.measures.push((name.to_string(), Vec::new()));
                self.measures.len() - 1
            }
        };
        &mut self.measures[idx].1
    }
}

/// Measures computed in-process from a fold's own contingency table, i.e.
/// at the zero decision threshold.
///
/// When one of these names is requested, its native value is recorded as
/// `<name>-zero` next to the service's value under `<name>`, so the two can
/// be compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeMeasure {
    Auc,
    Mcc,
    Accuracy,
    Sensitivity,
    Specificity,
}

impl NativeMeasure {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "AUC" => Some(Self::Auc),
            "MCC" => Some(Self::Mcc),
            "Accuracy" => Some(Self::Accuracy),
            "Sensitivity" => Some(Self::Sensitivity),
            "Specificity" => Some(Self::Specificity),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Auc => "AUC",
            Self::Mcc => "MCC",
            Self::Accuracy => "Accuracy",
            Self::Sensitivity => "Sensitivity",
            Self::Specificity => "Specificity",
        }
    }

    /// Store name of the native value.
    pub fn zero_name(self) -> String {
        format!("{}-zero", self.name())
    }

    /// Value from `table` as a fraction, comparable with the service's
    /// measures. `None` for AUC, which needs the decision values.
    pub fn at_zero(self, table: &ContingencyTable) -> Option<f64> {
        match self {
            Self::Auc => None,
            Self::Mcc => Some(table.matthews_correlation()),
            Self::Accuracy => Some(table.accuracy() / 100.0),
            Self::Sensitivity => Some(table.sensitivity() / 100.0),
            Self::Specificity => Some(table.specificity() / 100.0),
        }
    }
}
