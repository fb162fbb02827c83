//! In-process performance measures over a scored binary prediction.
//!
//! Measures follow the usual ROC-analysis vocabulary (`acc`, `tpr`, `fpr`,
//! `mat`, `auc`, ...). Threshold-dependent measures are evaluated at every
//! distinct cutoff: `+inf` first, then each distinct score in descending
//! order. An instance is predicted positive at a cutoff when
//! `score >= cutoff`. The only threshold-independent measure is `auc`.
//!
//! Labels passed here are expected in the `0/1` convention produced by
//! [`roc_labels`](crate::labels::roc_labels).

use std::fmt;
use std::str::FromStr;

use foldwise_core::{FoldwiseError, Result};

use crate::stats_service::StatValue;

// ---------------------------------------------------------------------------
// Measure names
// ---------------------------------------------------------------------------

/// A performance measure understood by the local statistics backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PerformanceMeasure {
    /// Accuracy: `(TP + TN) / n`.
    Accuracy,
    /// Error rate: `(FP + FN) / n`.
    ErrorRate,
    /// False positive rate (fallout): `FP / N`.
    FalsePositiveRate,
    /// True positive rate (recall, sensitivity): `TP / P`.
    TruePositiveRate,
    /// False negative rate (miss): `FN / P`.
    FalseNegativeRate,
    /// True negative rate (specificity): `TN / N`.
    TrueNegativeRate,
    /// Positive predictive value (precision): `TP / (TP + FP)`.
    PositivePredictiveValue,
    /// Negative predictive value: `TN / (TN + FN)`.
    NegativePredictiveValue,
    /// Matthews correlation coefficient (phi).
    Phi,
    /// F measure with equal weight on precision and recall.
    FMeasure,
    /// Rate of positive predictions: `(TP + FP) / n`.
    RatePositivePredictions,
    /// Rate of negative predictions: `(TN + FN) / n`.
    RateNegativePredictions,
    /// Area under the ROC curve.
    Auc,
}

impl PerformanceMeasure {
    /// Whether the measure yields one scalar rather than one value per cutoff.
    pub fn is_scalar(self) -> bool {
        matches!(self, Self::Auc)
    }

    /// Canonical short name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Accuracy => "acc",
            Self::ErrorRate => "err",
            Self::FalsePositiveRate => "fpr",
            Self::TruePositiveRate => "tpr",
            Self::FalseNegativeRate => "fnr",
            Self::TrueNegativeRate => "tnr",
            Self::PositivePredictiveValue => "ppv",
            Self::NegativePredictiveValue => "npv",
            Self::Phi => "phi",
            Self::FMeasure => "f",
            Self::RatePositivePredictions => "rpp",
            Self::RateNegativePredictions => "rnp",
            Self::Auc => "auc",
        }
    }

    fn at(self, c: &ThresholdCounts) -> f64 {
        let tp = c.tp as f64;
        let fp = c.fp as f64;
        let tn = c.tn as f64;
        let fne = c.fn_ as f64;
        let n = tp + fp + tn + fne;
        match self {
            Self::Accuracy => ratio(tp + tn, n),
            Self::ErrorRate => ratio(fp + fne, n),
            Self::FalsePositiveRate => ratio(fp, fp + tn),
            Self::TruePositiveRate => ratio(tp, tp + fne),
            Self::FalseNegativeRate => ratio(fne, tp + fne),
            Self::TrueNegativeRate => ratio(tn, fp + tn),
            Self::PositivePredictiveValue => ratio(tp, tp + fp),
            Self::NegativePredictiveValue => ratio(tn, tn + fne),
            Self::Phi => {
                let denom = ((tp + fne) * (fp + tn) * (tp + fp) * (fne + tn)).sqrt();
                ratio(tp * tn - fp * fne, denom)
            }
            Self::FMeasure => {
                let p = ratio(tp, tp + fp);
                let r = ratio(tp, tp + fne);
                1.0 / (0.5 / p + 0.5 / r)
            }
            Self::RatePositivePredictions => ratio(tp + fp, n),
            Self::RateNegativePredictions => ratio(tn + fne, n),
            Self::Auc => f64::NAN,
        }
    }
}

impl fmt::Display for PerformanceMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PerformanceMeasure {
    type Err = FoldwiseError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "acc" | "Accuracy" => Self::Accuracy,
            "err" => Self::ErrorRate,
            "fpr" | "fall" => Self::FalsePositiveRate,
            "tpr" | "rec" | "sens" | "Sensitivity" => Self::TruePositiveRate,
            "fnr" | "miss" => Self::FalseNegativeRate,
            "tnr" | "spec" | "Specificity" => Self::TrueNegativeRate,
            "ppv" | "prec" => Self::PositivePredictiveValue,
            "npv" => Self::NegativePredictiveValue,
            "phi" | "mat" | "MCC" => Self::Phi,
            "f" => Self::FMeasure,
            "rpp" => Self::RatePositivePredictions,
            "rnp" => Self::RateNegativePredictions,
            "auc" | "AUC" => Self::Auc,
            other => {
                return Err(FoldwiseError::InvalidInput(format!(
                    "unknown performance measure '{}'",
                    other
                )))
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Counts per cutoff
// ---------------------------------------------------------------------------

/// Confusion counts obtained by predicting positive when `score >= cutoff`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdCounts {
    pub cutoff: f64,
    pub tp: usize,
    pub fp: usize,
    pub tn: usize,
    pub fn_: usize,
}

/// Confusion counts at every distinct cutoff, largest cutoff first.
///
/// # Errors
///
/// Returns an error if the slices are empty, differ in length, or contain
/// NaN scores.
pub fn threshold_counts(scores: &[f64], labels: &[f64]) -> Result<Vec<ThresholdCounts>> {
    validate(scores, labels)?;

    let total_pos = labels.iter().filter(|&&l| l >= 1.0).count();
    let total_neg = labels.len() - total_pos;

    let mut indices: Vec<usize> = (0..scores.len()).collect();
    indices.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut counts = Vec::with_capacity(scores.len() + 1);
    counts.push(ThresholdCounts {
        cutoff: f64::INFINITY,
        tp: 0,
        fp: 0,
        tn: total_neg,
        fn_: total_pos,
    });

    let mut tp = 0usize;
    let mut fp = 0usize;
    let mut i = 0;
    while i < indices.len() {
        let current = scores[indices[i]];
        while i < indices.len() && scores[indices[i]] == current {
            if labels[indices[i]] >= 1.0 {
                tp += 1;
            } else {
                fp += 1;
            }
            i += 1;
        }
        counts.push(ThresholdCounts {
            cutoff: current,
            tp,
            fp,
            tn: total_neg - fp,
            fn_: total_pos - tp,
        });
    }

    Ok(counts)
}

/// Area under the ROC curve (trapezoidal over all cutoffs).
///
/// Tied scores are grouped, which amounts to counting half a win per tied
/// positive/negative pair.
///
/// # Errors
///
/// Returns an error on invalid input or when only one class is present.
pub fn roc_auc(scores: &[f64], labels: &[f64]) -> Result<f64> {
    let counts = threshold_counts(scores, labels)?;
    let first = counts[0];
    let p = first.fn_ as f64;
    let n = first.tn as f64;
    if p == 0.0 || n == 0.0 {
        return Err(FoldwiseError::StatisticsService(
            "ROC AUC needs both classes in the labels".into(),
        ));
    }

    let fpr: Vec<f64> = counts.iter().map(|c| c.fp as f64 / n).collect();
    let tpr: Vec<f64> = counts.iter().map(|c| c.tp as f64 / p).collect();
    Ok(trapezoidal_auc(&fpr, &tpr))
}

/// Evaluate one measure over `(scores, labels)`.
///
/// Scalar measures produce [`StatValue::Scalar`]; the others produce one
/// value per cutoff in [`StatValue::PerThreshold`].
pub fn performance(scores: &[f64], labels: &[f64], measure: PerformanceMeasure) -> Result<StatValue> {
    if measure.is_scalar() {
        return Ok(StatValue::Scalar(roc_auc(scores, labels)?));
    }
    let counts = threshold_counts(scores, labels)?;
    let cutoffs = counts.iter().map(|c| c.cutoff).collect();
    let values = counts.iter().map(|c| measure.at(c)).collect();
    Ok(StatValue::PerThreshold { cutoffs, values })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn validate(scores: &[f64], labels: &[f64]) -> Result<()> {
    if scores.is_empty() {
        return Err(FoldwiseError::InvalidInput("empty input".into()));
    }
    if scores.len() != labels.len() {
        return Err(FoldwiseError::InvalidInput(format!(
            "scores length {} != labels length {}",
            scores.len(),
            labels.len()
        )));
    }
    if scores.iter().any(|s| s.is_nan()) {
        return Err(FoldwiseError::InvalidInput("NaN score".into()));
    }
    Ok(())
}

fn ratio(numer: f64, denom: f64) -> f64 {
    if denom == 0.0 {
        f64::NAN
    } else {
        numer / denom
    }
}

/// Trapezoidal AUC: sum of trapezoids between consecutive (x, y) points.
fn trapezoidal_auc(x: &[f64], y: &[f64]) -> f64 {
    let mut auc = 0.0;
    for i in 1..x.len() {
        auc += (x[i] - x[i - 1]).abs() * (y[i] + y[i - 1]) / 2.0;
    }
    auc
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
