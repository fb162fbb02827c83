//! Classifier and problem abstractions consumed by the evaluation engine.
//!
//! The engine never looks inside a backend: it only asks a [`Problem`] for
//! labels and filtered views, and asks a [`Classifier`] to train and predict.

use foldwise_core::{FoldwiseError, Result};

use crate::scaling::FeatureScaler;

/// A labelled set of instances addressed by 0-based index.
pub trait Problem: Sized {
    /// Number of instances.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Label of instance `index`.
    fn label(&self, index: usize) -> f64;

    /// A new problem restricted to `keep`, preserving the order of `keep`.
    fn filter(&self, keep: &[usize]) -> Self;

    /// A new problem with instance `index` removed.
    fn without(&self, index: usize) -> Self {
        let keep: Vec<usize> = (0..self.len()).filter(|&i| i != index).collect();
        self.filter(&keep)
    }

    /// All labels, in index order.
    fn labels(&self) -> Vec<f64> {
        (0..self.len()).map(|i| self.label(i)).collect()
    }

    /// Feed every feature column of this problem to `scaler`.
    fn observe_features(&self, scaler: &mut dyn FeatureScaler);

    /// A copy with every feature value passed through `scaler`.
    fn scale_features(&self, scaler: &dyn FeatureScaler) -> Self;
}

/// A trainable binary classifier backend.
pub trait Classifier {
    type Problem: Problem;
    type Model;

    /// An empty problem in this backend's native representation.
    fn new_problem(&self) -> Self::Problem;

    /// Train a model on every instance of `problem`.
    fn train(&self, problem: &Self::Problem) -> Result<Self::Model>;

    /// Decision value for instance `index` of `problem`. Negative values
    /// predict the negative class.
    fn predict(&self, model: &Self::Model, problem: &Self::Problem, index: usize) -> Result<f64>;

    /// Like [`predict`](Self::predict), also filling `probabilities` with
    /// `[P(negative), P(positive)]` when the backend can estimate them.
    fn predict_with_probabilities(
        &self,
        model: &Self::Model,
        problem: &Self::Problem,
        index: usize,
        probabilities: &mut [f64; 2],
    ) -> Result<f64> {
        let _ = probabilities;
        self.predict(model, problem, index)
    }
}

// ---------------------------------------------------------------------------
// Dense in-memory problem
// ---------------------------------------------------------------------------

/// Row-major dense feature matrix with one label per row.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DenseProblem {
    data: Vec<f64>,
    labels: Vec<f64>,
    n_features: usize,
}

impl DenseProblem {
    /// An empty problem whose instances will have `n_features` features.
    pub fn new(n_features: usize) -> Self {
        Self {
            data: Vec::new(),
            labels: Vec::new(),
            n_features,
        }
    }

    /// Build from a flat row-major matrix.
    ///
    /// # Errors
    ///
    /// Returns an error if `data.len() != labels.len() * n_features`.
    pub fn from_rows(data: Vec<f64>, labels: &[f64], n_features: usize) -> Result<Self> {
        if data.len() != labels.len() * n_features {
            return Err(FoldwiseError::InvalidInput(format!(
                "data length {} != {} rows x {} features",
                data.len(),
                labels.len(),
                n_features
            )));
        }
        Ok(Self {
            data,
            labels: labels.iter().map(|&l| recode_label(l)).collect(),
            n_features,
        })
    }

    /// Append an instance and return its index. A label of `0` is stored
    /// as `-1`.
    ///
    /// # Errors
    ///
    /// Returns an error if `features` has the wrong length.
    pub fn add_instance(&mut self, label: f64, features: &[f64]) -> Result<usize> {
        if features.len() != self.n_features {
            return Err(FoldwiseError::InvalidInput(format!(
                "expected {} features, got {}",
                self.n_features,
                features.len()
            )));
        }
        self.data.extend_from_slice(features);
        self.labels.push(recode_label(label));
        Ok(self.labels.len() - 1)
    }

    pub fn set_label(&mut self, index: usize, label: f64) {
        self.labels[index] = recode_label(label);
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Feature row of instance `index`.
    pub fn features(&self, index: usize) -> &[f64] {
        &self.data[index * self.n_features..(index + 1) * self.n_features]
    }
}

impl Problem for DenseProblem {
    fn len(&self) -> usize {
        self.labels.len()
    }

    fn label(&self, index: usize) -> f64 {
        self.labels[index]
    }

    fn filter(&self, keep: &[usize]) -> Self {
        let mut out = DenseProblem::new(self.n_features);
        out.data.reserve(keep.len() * self.n_features);
        for &i in keep {
            out.data.extend_from_slice(self.features(i));
            out.labels.push(self.labels[i]);
        }
        out
    }

    fn observe_features(&self, scaler: &mut dyn FeatureScaler) {
        let mut column = Vec::with_capacity(self.labels.len());
        for feature in 0..self.n_features {
            column.clear();
            column.extend(self.data.iter().skip(feature).step_by(self.n_features));
            scaler.observe(feature, &column);
        }
    }

    fn scale_features(&self, scaler: &dyn FeatureScaler) -> Self {
        let data = self
            .data
            .iter()
            .enumerate()
            .map(|(idx, &value)| scaler.scale(idx % self.n_features, value))
            .collect();
        Self {
            data,
            labels: self.labels.clone(),
            n_features: self.n_features,
        }
    }
}

fn recode_label(label: f64) -> f64 {
    if label == 0.0 {
        -1.0
    } else {
        label
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scaling::ZScoreScaler;

    fn problem() -> DenseProblem {
        DenseProblem::from_rows(
            vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0],
            &[1.0, 0.0, 1.0, -1.0],
            2,
        )
        .unwrap()
    }

    #[test]
    fn zero_labels_are_recoded() {
        let p = problem();
        assert_eq!(p.labels(), vec![1.0, -1.0, 1.0, -1.0]);
    }

    #[test]
    fn filter_preserves_requested_order() {
        let p = problem();
        let f = p.filter(&[3, 0]);
        assert_eq!(f.len(), 2);
        assert_eq!(f.features(0), &[6.0, 7.0]);
        assert_eq!(f.features(1), &[0.0, 1.0]);
        assert_eq!(f.labels(), vec![-1.0, 1.0]);
    }

    #[test]
    fn without_drops_one_instance() {
        let p = problem();
        let w = p.without(1);
        assert_eq!(w.len(), 3);
        assert_eq!(w.features(1), &[4.0, 5.0]);
    }

    #[test]
    fn add_instance_checks_width() {
        let mut p = DenseProblem::new(3);
        assert_eq!(p.add_instance(1.0, &[1.0, 2.0, 3.0]).unwrap(), 0);
        assert!(p.add_instance(1.0, &[1.0]).is_err());
        p.set_label(0, 0.0);
        assert_eq!(p.label(0), -1.0);
    }

    #[test]
    fn scaling_uses_column_statistics() {
        let p = problem();
        let mut scaler = ZScoreScaler::new();
        p.observe_features(&mut scaler);
        // columns: [0, 2, 4, 6] and [1, 3, 5, 7]
        let (mean0, _) = scaler.statistics(0).unwrap();
        let (mean1, _) = scaler.statistics(1).unwrap();
        assert_eq!((mean0, mean1), (3.0, 4.0));

        let scaled = p.scale_features(&scaler);
        assert_eq!(scaled.labels(), p.labels());
        for f in 0..2 {
            let col_sum: f64 = (0..4).map(|i| scaled.features(i)[f]).sum();
            assert!(col_sum.abs() < 1e-12);
        }
    }

    #[test]
    fn from_rows_checks_shape() {
        assert!(DenseProblem::from_rows(vec![1.0, 2.0, 3.0], &[1.0, -1.0], 2).is_err());
    }
}
