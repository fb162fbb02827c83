//! Nearest-centroid baseline classifier.
//!
//! Each class is summarised by the mean of its training rows. The decision
//! for an instance is `d(x, negative centroid) - d(x, positive centroid)`,
//! so instances closer to the positive centroid get a positive decision.

use foldwise_core::{FoldwiseError, Result};

use crate::labels::{contingency_class, BinaryClass};
use crate::problem::{Classifier, DenseProblem, Problem};

/// Trained class centroids.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CentroidModel {
    /// Mean feature vector of the negative class.
    pub negative: Vec<f64>,
    /// Mean feature vector of the positive class.
    pub positive: Vec<f64>,
}

/// Nearest-centroid classifier over [`DenseProblem`]s.
#[derive(Debug, Clone, Default)]
pub struct NearestCentroid {
    /// Width of problems created by [`Classifier::new_problem`].
    pub n_features: usize,
}

impl NearestCentroid {
    pub fn new(n_features: usize) -> Self {
        Self { n_features }
    }
}

impl Classifier for NearestCentroid {
    type Problem = DenseProblem;
    type Model = CentroidModel;

    fn new_problem(&self) -> DenseProblem {
        DenseProblem::new(self.n_features)
    }

    fn train(&self, problem: &DenseProblem) -> Result<CentroidModel> {
        let d = problem.n_features();
        let mut negative = vec![0.0; d];
        let mut positive = vec![0.0; d];
        let mut n_neg = 0usize;
        let mut n_pos = 0usize;

        for i in 0..problem.len() {
            let (sum, count) = match contingency_class(problem.label(i)) {
                BinaryClass::Negative => (&mut negative, &mut n_neg),
                BinaryClass::Positive => (&mut positive, &mut n_pos),
            };
            for (s, &x) in sum.iter_mut().zip(problem.features(i)) {
                *s += x;
            }
            *count += 1;
        }

        if n_neg == 0 || n_pos == 0 {
            return Err(FoldwiseError::Training(format!(
                "nearest centroid needs both classes (negatives={}, positives={})",
                n_neg, n_pos
            )));
        }

        for s in &mut negative {
            *s /= n_neg as f64;
        }
        for s in &mut positive {
            *s /= n_pos as f64;
        }
        Ok(CentroidModel { negative, positive })
    }

    fn predict(&self, model: &CentroidModel, problem: &DenseProblem, index: usize) -> Result<f64> {
        let x = problem.features(index);
        if x.len() != model.positive.len() {
            return Err(FoldwiseError::InvalidInput(format!(
                "model has {} features, instance has {}",
                model.positive.len(),
                x.len()
            )));
        }
        Ok(euclidean(x, &model.negative) - euclidean(x, &model.positive))
    }

    fn predict_with_probabilities(
        &self,
        model: &CentroidModel,
        problem: &DenseProblem,
        index: usize,
        probabilities: &mut [f64; 2],
    ) -> Result<f64> {
        let decision = self.predict(model, problem, index)?;
        let p_pos = 1.0 / (1.0 + (-decision).exp());
        probabilities[0] = 1.0 - p_pos;
        probabilities[1] = p_pos;
        Ok(decision)
    }
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable() -> DenseProblem {
        DenseProblem::from_rows(
            vec![0.0, 0.0, 0.2, 0.1, 0.1, 0.3, 5.0, 5.0, 5.2, 4.9, 4.8, 5.1],
            &[-1.0, -1.0, -1.0, 1.0, 1.0, 1.0],
            2,
        )
        .unwrap()
    }

    #[test]
    fn centroids_are_class_means() {
        let model = NearestCentroid::new(2).train(&separable()).unwrap();
        assert!((model.negative[0] - 0.1).abs() < 1e-12);
        assert!((model.positive[1] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn decisions_follow_class() {
        let clf = NearestCentroid::new(2);
        let p = separable();
        let model = clf.train(&p).unwrap();
        for i in 0..p.len() {
            let d = clf.predict(&model, &p, i).unwrap();
            assert_eq!(d > 0.0, p.label(i) > 0.0);
        }
    }

    #[test]
    fn probabilities_sum_to_one() {
        let clf = NearestCentroid::new(2);
        let p = separable();
        let model = clf.train(&p).unwrap();
        let mut probs = [0.0; 2];
        let d = clf.predict_with_probabilities(&model, &p, 4, &mut probs).unwrap();
        assert!(d > 0.0);
        assert!((probs[0] + probs[1] - 1.0).abs() < 1e-12);
        assert!(probs[1] > 0.5);
    }

    #[test]
    fn single_class_training_fails() {
        let p = separable().filter(&[0, 1, 2]);
        let err = NearestCentroid::new(2).train(&p).unwrap_err();
        assert!(matches!(err, FoldwiseError::Training(_)));
    }

    #[test]
    fn new_problem_has_configured_width() {
        assert_eq!(NearestCentroid::new(7).new_problem().n_features(), 7);
    }
}
