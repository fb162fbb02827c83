//! Binary contingency table (confusion matrix).
//!
//! Rates are reported as percentages in `[0, 100]`. Any rate whose
//! denominator is zero is `NaN`, so that averaging across folds can drop the
//! contribution instead of failing.

use foldwise_core::Summarizable;

use crate::labels::{contingency_class, decision_class, BinaryClass};

/// Counts of true/false positives and negatives for a binary classifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContingencyTable {
    tp: u64,
    fp: u64,
    tn: u64,
    #[cfg_attr(feature = "serde", serde(rename = "fn"))]
    fn_: u64,
}

impl ContingencyTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from explicit counts.
    pub fn from_counts(tp: u64, fp: u64, tn: u64, fn_: u64) -> Self {
        Self { tp, fp, tn, fn_ }
    }

    /// Record one prediction.
    ///
    /// The decision is thresholded at zero (zero is positive); the true label
    /// is positive iff it is `> 0`.
    pub fn observe_decision(&mut self, true_label: f64, decision: f64) {
        let actual = contingency_class(true_label);
        let predicted = decision_class(decision);
        match (actual, predicted) {
            (BinaryClass::Positive, BinaryClass::Positive) => self.tp += 1,
            (BinaryClass::Negative, BinaryClass::Positive) => self.fp += 1,
            (BinaryClass::Negative, BinaryClass::Negative) => self.tn += 1,
            (BinaryClass::Positive, BinaryClass::Negative) => self.fn_ += 1,
        }
    }

    /// No-op: counts are exact sums, there is nothing to normalise.
    pub fn average(&mut self) {}

    /// Add the counts of `other` into this table.
    pub fn merge(&mut self, other: &ContingencyTable) {
        self.tp += other.tp;
        self.fp += other.fp;
        self.tn += other.tn;
        self.fn_ += other.fn_;
    }

    pub fn tp(&self) -> u64 {
        self.tp
    }

    pub fn fp(&self) -> u64 {
        self.fp
    }

    pub fn tn(&self) -> u64 {
        self.tn
    }

    pub fn fn_(&self) -> u64 {
        self.fn_
    }

    /// Total number of observations.
    pub fn total(&self) -> u64 {
        self.tp + self.fp + self.tn + self.fn_
    }

    /// `100 * (FP + FN) / total`.
    pub fn error_rate(&self) -> f64 {
        percent(self.fp + self.fn_, self.total())
    }

    /// `100 - error_rate`.
    pub fn accuracy(&self) -> f64 {
        100.0 - self.error_rate()
    }

    /// `100 * TP / (TP + FP)`.
    pub fn precision(&self) -> f64 {
        percent(self.tp, self.tp + self.fp)
    }

    /// `100 * TP / (TP + FN)`.
    pub fn recall(&self) -> f64 {
        percent(self.tp, self.tp + self.fn_)
    }

    /// Same as [`recall`](Self::recall).
    pub fn sensitivity(&self) -> f64 {
        self.recall()
    }

    /// `100 * TN / (TN + FP)`.
    pub fn specificity(&self) -> f64 {
        percent(self.tn, self.tn + self.fp)
    }

    /// `100 - specificity`.
    pub fn false_positive_rate(&self) -> f64 {
        100.0 - self.specificity()
    }

    /// `100 - recall`.
    pub fn false_negative_rate(&self) -> f64 {
        100.0 - self.recall()
    }

    /// Same as [`precision`](Self::precision).
    pub fn positive_predictive_value(&self) -> f64 {
        self.precision()
    }

    /// `100 * TN / (TN + FN)`.
    pub fn negative_predictive_value(&self) -> f64 {
        percent(self.tn, self.tn + self.fn_)
    }

    /// Harmonic mean of precision and recall.
    ///
    /// Zero when `precision + recall == 0`; `NaN` when either is undefined.
    pub fn f1_measure(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        let denom = p + r;
        if denom == 0.0 {
            0.0
        } else {
            2.0 * p * r / denom
        }
    }

    /// Matthews correlation coefficient in `[-1, 1]`; `NaN` when any
    /// marginal is empty.
    pub fn matthews_correlation(&self) -> f64 {
        let (tp, fp, tn, fne) = (
            self.tp as f64,
            self.fp as f64,
            self.tn as f64,
            self.fn_ as f64,
        );
        let denom = ((tp + fp) * (tp + fne) * (tn + fp) * (tn + fne)).sqrt();
        if denom == 0.0 {
            f64::NAN
        } else {
            (tp * tn - fp * fne) / denom
        }
    }
}

impl Summarizable for ContingencyTable {
    fn summary(&self) -> String {
        format!(
            "TP={} FP={} TN={} FN={}",
            self.tp, self.fp, self.tn, self.fn_
        )
    }
}

fn percent(numer: u64, denom: u64) -> f64 {
    if denom == 0 {
        f64::NAN
    } else {
        100.0 * numer as f64 / denom as f64
    }
}
