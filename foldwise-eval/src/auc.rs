//! ROC AUC and general performance measures over decision/label vectors.
//!
//! Degenerate single-class inputs have an exact answer that the general
//! ROC computation cannot produce, so [`short_circuit`] handles them first.
//! Everything else is delegated to a statistics service reached through an
//! injected [`ConnectionPool`].

use std::sync::Arc;

use foldwise_core::{FoldwiseError, Result};
use tracing::warn;

use crate::labels::roc_labels;
use crate::stats_service::{ConnectionPool, PerformanceQuery, PooledConnection, StatValue};

const PREDICTIONS_VAR: &str = "predictions";
const LABELS_VAR: &str = "labels";

/// Exact ROC AUC for single-class inputs.
///
/// Labels are recoded to `0/1` first. When every label is in the same class
/// and every decision has the same strict sign, the answer is known:
///
/// | labels | all decisions `> 0` | all decisions `< 0` |
/// |--------|---------------------|---------------------|
/// | all 0  | 0                   | 1                   |
/// | all 1  | 1                   | 0                   |
///
/// Returns `None` in every other case, including any decision exactly 0.
pub fn short_circuit(decisions: &[f64], labels: &[f64]) -> Option<f64> {
    if decisions.is_empty() || decisions.len() != labels.len() {
        return None;
    }
    let labels = roc_labels(labels);
    let all_negative_labels = labels.iter().all(|&l| l == 0.0);
    let all_positive_labels = labels.iter().all(|&l| l == 1.0);
    let all_positive_decisions = decisions.iter().all(|&d| d > 0.0);
    let all_negative_decisions = decisions.iter().all(|&d| d < 0.0);

    match (all_negative_labels, all_positive_labels) {
        (true, _) if all_positive_decisions => Some(0.0),
        (true, _) if all_negative_decisions => Some(1.0),
        (_, true) if all_positive_decisions => Some(1.0),
        (_, true) if all_negative_decisions => Some(0.0),
        _ => None,
    }
}

/// Pick the value at the smallest non-negative cutoff.
///
/// Cutoffs are scanned from the largest down; the last one that is still
/// `>= 0` wins. This matches the sign rule used for binary decisions.
pub fn value_at_zero_threshold(cutoffs: &[f64], values: &[f64]) -> Option<f64> {
    cutoffs
        .iter()
        .zip(values)
        .take_while(|&(&c, _)| c >= 0.0)
        .last()
        .map(|(_, &v)| v)
}

/// Computes ROC AUC and named performance measures.
#[derive(Clone)]
pub struct AucEvaluator {
    pool: Arc<dyn ConnectionPool>,
}

impl std::fmt::Debug for AucEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AucEvaluator").finish_non_exhaustive()
    }
}

impl AucEvaluator {
    /// Evaluator using `pool` for delegated computations. The caller keeps
    /// ownership of the pool and decides when to shut it down.
    pub fn new(pool: Arc<dyn ConnectionPool>) -> Self {
        Self { pool }
    }

    /// Area under the ROC curve.
    ///
    /// Uses [`short_circuit`] when it applies; otherwise asks the service for
    /// `auc`. Returns `None` when the service fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the vectors are empty or differ in length.
    pub fn area_under_roc(&self, decisions: &[f64], labels: &[f64]) -> Result<Option<f64>> {
        validate(decisions, labels)?;
        if let Some(auc) = short_circuit(decisions, labels) {
            return Ok(Some(auc));
        }
        Ok(self.delegate(decisions, labels, &["auc"]).pop().flatten())
    }

    /// Evaluate each named measure, in the order requested.
    ///
    /// Scalar measures are taken as-is; per-threshold measures are read at
    /// the zero threshold (see [`value_at_zero_threshold`]). A measure the
    /// service fails to compute is `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the vectors are empty or differ in length.
    pub fn evaluate_measures<S>(
        &self,
        decisions: &[f64],
        labels: &[f64],
        measures: &[S],
    ) -> Result<Vec<(String, Option<f64>)>>
    where
        S: AsRef<str>,
    {
        validate(decisions, labels)?;
        let names: Vec<&str> = measures.iter().map(AsRef::as_ref).collect();
        let values = self.delegate(decisions, labels, &names);
        Ok(names
            .into_iter()
            .map(str::to_string)
            .zip(values)
            .collect())
    }

    /// One service round-trip: assign both vectors, evaluate every measure.
    fn delegate(&self, decisions: &[f64], labels: &[f64], measures: &[&str]) -> Vec<Option<f64>> {
        let mut conn = match PooledConnection::acquire(self.pool.as_ref()) {
            Ok(conn) => conn,
            Err(e) => {
                warn!(error = %e, "cannot reach statistics service");
                return vec![None; measures.len()];
            }
        };

        let labels01 = roc_labels(labels);
        let assigned = conn
            .assign(PREDICTIONS_VAR, decisions)
            .and_then(|_| conn.assign(LABELS_VAR, &labels01));
        if let Err(e) = assigned {
            warn!(error = %e, "cannot send vectors to statistics service");
            return vec![None; measures.len()];
        }

        measures
            .iter()
            .map(|&measure| {
                let query = PerformanceQuery::new(PREDICTIONS_VAR, LABELS_VAR, measure);
                match conn.evaluate(&query) {
                    Ok(StatValue::Scalar(v)) => Some(v),
                    Ok(StatValue::PerThreshold { cutoffs, values }) => {
                        value_at_zero_threshold(&cutoffs, &values)
                    }
                    Err(e) => {
                        warn!(measure, error = %e, "cannot calculate performance measure");
                        None
                    }
                }
            })
            .collect()
    }
}

fn validate(decisions: &[f64], labels: &[f64]) -> Result<()> {
    if decisions.is_empty() {
        return Err(FoldwiseError::InvalidInput("empty decision vector".into()));
    }
    if decisions.len() != labels.len() {
        return Err(FoldwiseError::InvalidInput(format!(
            "number of decisions ({}) must match number of labels ({})",
            decisions.len(),
            labels.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_pools {
    //! Pool doubles that count traffic and can be told to fail.

    use std::sync::atomic::{AtomicUsize, Ordering};

    use foldwise_core::{FoldwiseError, Result};

    use crate::stats_service::{
        ConnectionPool, LocalConnection, PerformanceQuery, StatValue, StatisticsConnection,
    };

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Failure {
        None,
        Borrow,
        Evaluate,
    }

    #[derive(Debug)]
    pub struct CountingPool {
        pub failure: Failure,
        pub borrowed: AtomicUsize,
        pub returned: AtomicUsize,
        pub evaluations: std::sync::Arc<AtomicUsize>,
    }

    impl CountingPool {
        pub fn new(failure: Failure) -> Self {
            Self {
                failure,
                borrowed: AtomicUsize::new(0),
                returned: AtomicUsize::new(0),
                evaluations: Default::default(),
            }
        }

        pub fn borrowed(&self) -> usize {
            self.borrowed.load(Ordering::SeqCst)
        }

        pub fn returned(&self) -> usize {
            self.returned.load(Ordering::SeqCst)
        }

        pub fn evaluations(&self) -> usize {
            self.evaluations.load(Ordering::SeqCst)
        }
    }

    struct CountingConnection {
        inner: LocalConnection,
        fail: bool,
        evaluations: std::sync::Arc<AtomicUsize>,
    }

    impl StatisticsConnection for CountingConnection {
        fn assign(&mut self, name: &str, values: &[f64]) -> Result<()> {
            self.inner.assign(name, values)
        }

        fn evaluate(&mut self, query: &PerformanceQuery) -> Result<StatValue> {
            self.evaluations.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(FoldwiseError::StatisticsService("computation failed".into()));
            }
            self.inner.evaluate(query)
        }
    }

    impl ConnectionPool for CountingPool {
        fn borrow_connection(&self) -> Result<Box<dyn StatisticsConnection>> {
            if self.failure == Failure::Borrow {
                return Err(FoldwiseError::StatisticsService("connection refused".into()));
            }
            self.borrowed.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(CountingConnection {
                inner: LocalConnection::default(),
                fail: self.failure == Failure::Evaluate,
                evaluations: self.evaluations.clone(),
            }))
        }

        fn return_connection(&self, _connection: Box<dyn StatisticsConnection>) {
            self.returned.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_pools::{CountingPool, Failure};
    use super::*;

    fn evaluator(failure: Failure) -> (AucEvaluator, Arc<CountingPool>) {
        let pool = Arc::new(CountingPool::new(failure));
        (AucEvaluator::new(pool.clone()), pool)
    }

    #[test]
    fn short_circuit_table() {
        assert_eq!(short_circuit(&[1.0, 1.0], &[1.0, 1.0]), Some(1.0));
        assert_eq!(short_circuit(&[-1.0, -1.0], &[1.0, 1.0]), Some(0.0));
        assert_eq!(short_circuit(&[1.0, 1.0], &[0.0, 0.0]), Some(0.0));
        assert_eq!(short_circuit(&[-1.0, -1.0], &[0.0, 0.0]), Some(1.0));
        // -1 labels are recoded to 0
        assert_eq!(short_circuit(&[-2.0, -0.5], &[-1.0, -1.0]), Some(1.0));
    }

    #[test]
    fn short_circuit_falls_through() {
        assert_eq!(short_circuit(&[1.0, -1.0], &[1.0, 1.0]), None);
        assert_eq!(short_circuit(&[1.0, -1.0], &[0.0, 0.0]), None);
        assert_eq!(short_circuit(&[1.0, -1.0], &[0.0, 1.0]), None);
        assert_eq!(short_circuit(&[1.0, 1.0], &[1.0, -1.0]), None);
        assert_eq!(short_circuit(&[-1.0, -2.0], &[0.0, 1.0]), None);
        // zero decisions are neither strictly positive nor strictly negative
        assert_eq!(short_circuit(&[0.0, 0.0], &[1.0, 1.0]), None);
        assert_eq!(short_circuit(&[1.0, 0.0], &[1.0, 1.0]), None);
        assert_eq!(short_circuit(&[0.0, 0.0], &[0.0, 0.0]), None);
    }

    #[test]
    fn short_circuit_skips_service() {
        let (eval, pool) = evaluator(Failure::None);
        assert_eq!(eval.area_under_roc(&[1.0, 1.0], &[1.0, 1.0]).unwrap(), Some(1.0));
        assert_eq!(eval.area_under_roc(&[-1.0, -1.0], &[0.0, 0.0]).unwrap(), Some(1.0));
        assert_eq!(pool.borrowed(), 0);
        assert_eq!(pool.evaluations(), 0);
    }

    #[test]
    fn mixed_labels_delegate() {
        let (eval, pool) = evaluator(Failure::None);
        let auc = eval.area_under_roc(&[1.0, 1.0], &[1.0, -1.0]).unwrap();
        assert_eq!(pool.evaluations(), 1);
        assert_eq!(auc, Some(0.5));
        assert_eq!(pool.borrowed(), pool.returned());
    }

    #[test]
    fn zero_decisions_delegate() {
        let (eval, pool) = evaluator(Failure::None);
        // single-class labels cannot be scored by the general path
        let auc = eval.area_under_roc(&[0.0, 0.0], &[1.0, 1.0]).unwrap();
        assert_eq!(auc, None);
        assert_eq!(pool.evaluations(), 1);
        assert_eq!(pool.returned(), 1);
    }

    #[test]
    fn measures_read_at_zero_threshold() {
        let (eval, pool) = evaluator(Failure::None);
        let decisions = [-1.9, -1.2, -1.0, 1.1, 0.3, 0.6, -0.1];
        let labels = [0.0, 1.0, 0.0, 1.0, 1.0, 1.0, 0.0];
        let names = ["fpr", "tpr", "fnr", "acc", "prec", "rec", "mat", "auc"];
        let values = eval.evaluate_measures(&decisions, &labels, &names).unwrap();
        let expected = [0.0, 0.75, 0.25, 6.0 / 7.0, 1.0, 0.75, 0.75, 10.0 / 12.0];
        for ((name, value), (want_name, want)) in values.iter().zip(names.iter().zip(expected)) {
            assert_eq!(name, want_name);
            assert!((value.unwrap() - want).abs() < 1e-9, "{name}: {value:?}");
        }
        assert_eq!(pool.borrowed(), 1);
        assert_eq!(pool.returned(), 1);
    }

    #[test]
    fn perfect_split_measures() {
        let (eval, _pool) = evaluator(Failure::None);
        let values = eval
            .evaluate_measures(
                &[-1.0, 1.0, 1.0, 1.0, 1.0],
                &[0.0, 1.0, 1.0, 1.0, 1.0],
                &["fpr", "tpr", "acc", "mat", "auc"],
            )
            .unwrap();
        let got: Vec<f64> = values.iter().map(|(_, v)| v.unwrap()).collect();
        assert_eq!(got, vec![0.0, 1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn service_failure_yields_none_and_releases() {
        let (eval, pool) = evaluator(Failure::Evaluate);
        let auc = eval.area_under_roc(&[1.0, -1.0], &[1.0, 0.0]).unwrap();
        assert_eq!(auc, None);
        assert_eq!(pool.borrowed(), 1);
        assert_eq!(pool.returned(), 1);
    }

    #[test]
    fn unreachable_service_yields_none() {
        let (eval, pool) = evaluator(Failure::Borrow);
        let values = eval
            .evaluate_measures(&[1.0, -1.0], &[1.0, 0.0], &["auc", "mat"])
            .unwrap();
        assert!(values.iter().all(|(_, v)| v.is_none()));
        assert_eq!(pool.returned(), 0);
    }

    #[test]
    fn unknown_measure_is_none_others_survive() {
        let (eval, _pool) = evaluator(Failure::None);
        let values = eval
            .evaluate_measures(&[1.0, -1.0], &[1.0, 0.0], &["nope", "auc"])
            .unwrap();
        assert_eq!(values[0], ("nope".to_string(), None));
        assert_eq!(values[1], ("auc".to_string(), Some(1.0)));
    }

    #[test]
    fn malformed_vectors_rejected() {
        let (eval, _pool) = evaluator(Failure::None);
        assert!(eval.area_under_roc(&[], &[]).is_err());
        assert!(eval.area_under_roc(&[1.0], &[1.0, 0.0]).is_err());
    }

    #[test]
    fn zero_threshold_selection() {
        let cutoffs = [f64::INFINITY, 2.0, 0.5, 0.0, -1.0];
        let values = [0.0, 0.1, 0.2, 0.3, 0.4];
        assert_eq!(value_at_zero_threshold(&cutoffs, &values), Some(0.3));
        assert_eq!(value_at_zero_threshold(&[-1.0], &[0.9]), None);
    }
}
