//! Stratified random fold assignment.
//!
//! A [`FoldAssigner`] lays out the sequence `i mod k`, shuffles it with the
//! caller's random source and keeps the permutation only if every fold holds
//! both label classes. Rejected permutations are regenerated, up to a fixed
//! attempt budget; past it, each class is shuffled on its own and dealt
//! round-robin, which always succeeds once the feasibility check passed.

use foldwise_core::{FoldwiseError, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, warn};

use crate::labels::{contingency_class, BinaryClass};

/// Default number of permutations tried before giving up.
pub const DEFAULT_MAX_ATTEMPTS: usize = 10_000;

/// Mapping from instance index to fold id in `[0, k)`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FoldAssignment {
    folds: Vec<usize>,
    k: usize,
}

impl FoldAssignment {
    /// Number of folds.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Number of assigned instances.
    pub fn len(&self) -> usize {
        self.folds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.folds.is_empty()
    }

    /// Raw fold ids, indexed by instance.
    pub fn as_slice(&self) -> &[usize] {
        &self.folds
    }

    /// Instances held out in `fold`, in index order.
    pub fn test_indices(&self, fold: usize) -> Vec<usize> {
        (0..self.folds.len())
            .filter(|&i| self.folds[i] == fold)
            .collect()
    }

    /// Instances used for training when `fold` is held out, in index order.
    pub fn train_indices(&self, fold: usize) -> Vec<usize> {
        (0..self.folds.len())
            .filter(|&i| self.folds[i] != fold)
            .collect()
    }

    /// Whether every fold contains both label classes.
    pub fn is_stratified(&self, labels: &[f64]) -> bool {
        let mut seen = vec![(false, false); self.k];
        for (&fold, &label) in self.folds.iter().zip(labels) {
            match contingency_class(label) {
                BinaryClass::Negative => seen[fold].0 = true,
                BinaryClass::Positive => seen[fold].1 = true,
            }
        }
        seen.iter().all(|&(neg, pos)| neg && pos)
    }
}

/// Generate-and-validate fold assignment with a bounded attempt budget.
#[derive(Debug, Clone)]
pub struct FoldAssigner {
    max_attempts: usize,
}

impl Default for FoldAssigner {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl FoldAssigner {
    pub fn new(max_attempts: usize) -> Self {
        Self { max_attempts }
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Assign each of `labels.len()` instances to one of `k` folds so that
    /// every fold contains both classes.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if `k == 0`, `k > n`, or the labels hold fewer than
    ///   two classes.
    /// - `InfeasiblePartition` if the minority class has fewer than `k`
    ///   instances.
    pub fn assign<R>(&self, labels: &[f64], k: usize, rng: &mut R) -> Result<FoldAssignment>
    where
        R: Rng + ?Sized,
    {
        let n = labels.len();
        check_feasible(labels, k)?;

        let mut folds: Vec<usize> = (0..n).map(|i| i % k).collect();
        for attempt in 1..=self.max_attempts {
            folds.shuffle(rng);
            let candidate = FoldAssignment {
                folds: folds.clone(),
                k,
            };
            if candidate.is_stratified(labels) {
                debug!(n, k, attempt, "fold assignment accepted");
                return Ok(candidate);
            }
        }

        warn!(
            n,
            k,
            attempts = self.max_attempts,
            "random fold search exhausted, dealing folds per class"
        );
        Ok(deal_per_class(labels, k, rng))
    }
}

/// Shuffle each class separately and deal instances round-robin, positives
/// first, continuing the fold counter into the negatives.
///
/// Fold sizes differ by at most one, and every fold receives both classes
/// whenever each class has at least `k` instances.
fn deal_per_class<R>(labels: &[f64], k: usize, rng: &mut R) -> FoldAssignment
where
    R: Rng + ?Sized,
{
    let (mut positives, mut negatives): (Vec<usize>, Vec<usize>) = (0..labels.len())
        .partition(|&i| contingency_class(labels[i]) == BinaryClass::Positive);
    positives.shuffle(rng);
    negatives.shuffle(rng);

    let mut folds = vec![0; labels.len()];
    for (slot, &i) in positives.iter().chain(&negatives).enumerate() {
        folds[i] = slot % k;
    }
    FoldAssignment { folds, k }
}

/// Reject requests that no permutation can satisfy.
fn check_feasible(labels: &[f64], k: usize) -> Result<()> {
    let n = labels.len();
    if k == 0 {
        return Err(FoldwiseError::InvalidInput("k must be at least 1".into()));
    }
    if k > n {
        return Err(FoldwiseError::InvalidInput(format!(
            "k ({}) > n_samples ({})",
            k, n
        )));
    }
    let positives = labels
        .iter()
        .filter(|&&l| contingency_class(l) == BinaryClass::Positive)
        .count();
    let minority = positives.min(n - positives);
    if minority == 0 {
        return Err(FoldwiseError::InvalidInput(
            "labels must contain two classes".into(),
        ));
    }
    if minority < k {
        return Err(FoldwiseError::InfeasiblePartition(format!(
            "minority class has {} instances, fewer than k ({})",
            minority, k
        )));
    }
    Ok(())
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    proptest! {
        #[test]
        fn valid_assignments_are_stratified(
            labels in proptest::collection::vec(prop_oneof![Just(-1.0), Just(1.0)], 4..60),
            k in 2usize..6,
            seed in any::<u64>(),
        ) {
            let mut rng = StdRng::seed_from_u64(seed);
            match FoldAssigner::default().assign(&labels, k, &mut rng) {
                Ok(a) => {
                    prop_assert_eq!(a.len(), labels.len());
                    prop_assert!(a.as_slice().iter().all(|&f| f < k));
                    prop_assert!(a.is_stratified(&labels));
                }
                Err(FoldwiseError::InvalidInput(_)) | Err(FoldwiseError::InfeasiblePartition(_)) => {
                    let pos = labels.iter().filter(|&&l| l > 0.0).count();
                    let minority = pos.min(labels.len() - pos);
                    prop_assert!(minority == 0 || minority < k || k > labels.len());
                }
                Err(e) => prop_assert!(false, "unexpected error {e}"),
            }
        }
    }
}
