//! Label and decision recoding.
//!
//! Two label conventions coexist and must stay separate:
//!
//! - [`contingency_class`] is sign-based and feeds the contingency table and
//!   the fold stratification check. Anything `> 0` is positive, so both the
//!   `-1/1` and the `0/1` encodings work.
//! - [`roc_label`] produces the `0/1` vector handed to ROC computations and
//!   the statistics service. Only labels `>= 1` are positive.
//!
//! Decisions are recoded with [`decision_class`]: negative below zero,
//! positive otherwise (zero counts as positive).

/// Binary class of an instance or a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BinaryClass {
    /// The negative class (`-1` / `0`).
    Negative,
    /// The positive class (`1`).
    Positive,
}

/// Class of a true label for contingency and stratification purposes.
///
/// Labels `<= 0` are negative; labels `> 0` are positive.
#[inline]
pub fn contingency_class(label: f64) -> BinaryClass {
    if label > 0.0 {
        BinaryClass::Positive
    } else {
        BinaryClass::Negative
    }
}

/// Class predicted by a decision value. Zero is positive.
#[inline]
pub fn decision_class(decision: f64) -> BinaryClass {
    if decision < 0.0 {
        BinaryClass::Negative
    } else {
        BinaryClass::Positive
    }
}

/// Recode a label to the `0/1` convention used for ROC evaluation.
///
/// Labels `>= 1` map to `1.0`, everything else (including `-1`) to `0.0`.
#[inline]
pub fn roc_label(label: f64) -> f64 {
    if label >= 1.0 {
        1.0
    } else {
        0.0
    }
}

/// Recode a whole label vector with [`roc_label`].
pub fn roc_labels(labels: &[f64]) -> Vec<f64> {
    labels.iter().map(|&l| roc_label(l)).collect()
}

/// Number of distinct [`contingency_class`] values among `labels`.
pub fn distinct_classes<I>(labels: I) -> usize
where
    I: IntoIterator<Item = f64>,
{
    let mut seen_pos = false;
    let mut seen_neg = false;
    for label in labels {
        match contingency_class(label) {
            BinaryClass::Positive => seen_pos = true,
            BinaryClass::Negative => seen_neg = true,
        }
        if seen_pos && seen_neg {
            return 2;
        }
    }
    usize::from(seen_pos) + usize::from(seen_neg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contingency_treats_zero_and_minus_one_as_negative() {
        assert_eq!(contingency_class(-1.0), BinaryClass::Negative);
        assert_eq!(contingency_class(0.0), BinaryClass::Negative);
        assert_eq!(contingency_class(1.0), BinaryClass::Positive);
    }

    #[test]
    fn zero_decision_is_positive() {
        assert_eq!(decision_class(0.0), BinaryClass::Positive);
        assert_eq!(decision_class(-1e-12), BinaryClass::Negative);
        assert_eq!(decision_class(3.5), BinaryClass::Positive);
    }

    #[test]
    fn roc_recoding_is_zero_one() {
        assert_eq!(roc_labels(&[-1.0, 0.0, 1.0, 2.0]), vec![0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn distinct_class_count() {
        assert_eq!(distinct_classes(Vec::<f64>::new()), 0);
        assert_eq!(distinct_classes(vec![-1.0, 0.0]), 1);
        assert_eq!(distinct_classes(vec![1.0, 1.0]), 1);
        assert_eq!(distinct_classes(vec![1.0, -1.0, 1.0]), 2);
    }
}
