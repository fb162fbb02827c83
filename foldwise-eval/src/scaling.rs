//! Per-feature scaling fitted on training instances only.
//!
//! A [`FeatureScaler`] observes each feature column of a training problem,
//! then rescales values of both the training and the held-out problem with
//! those statistics. Cross-validation fits a fresh scaler for every split,
//! so nothing about a test fold reaches its model.

/// Feature scaling strategy.
pub trait FeatureScaler {
    /// Fit the statistics of `feature` from its training values.
    fn observe(&mut self, feature: usize, values: &[f64]);

    /// Scale one value of `feature`. Features never observed pass through.
    fn scale(&self, feature: usize, value: f64) -> f64;
}

/// Scaling applied by the cross-validation driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Scaling {
    /// Features are used as given.
    #[default]
    None,
    /// Per-feature z-score, see [`ZScoreScaler`].
    ZScore,
}

impl Scaling {
    /// A fresh, unfitted scaler, or `None` when no scaling is requested.
    pub fn scaler(self) -> Option<Box<dyn FeatureScaler>> {
        match self {
            Scaling::None => None,
            Scaling::ZScore => Some(Box::new(ZScoreScaler::default())),
        }
    }
}

/// Z-score scaling: `(x - mean) / sd` with population statistics.
///
/// A feature whose deviation is zero or below `0.1%` of its mean is mapped
/// to the sign of `x - mean` instead. A `NaN` result becomes 0.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ZScoreScaler {
    means: Vec<f64>,
    deviations: Vec<f64>,
}

impl ZScoreScaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fitted `(mean, sd)` of `feature`.
    pub fn statistics(&self, feature: usize) -> Option<(f64, f64)> {
        Some((*self.means.get(feature)?, *self.deviations.get(feature)?))
    }
}

impl FeatureScaler for ZScoreScaler {
    fn observe(&mut self, feature: usize, values: &[f64]) {
        if self.means.len() <= feature {
            self.means.resize(feature + 1, f64::NAN);
            self.deviations.resize(feature + 1, f64::NAN);
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        self.means[feature] = mean;
        self.deviations[feature] = var.sqrt();
    }

    fn scale(&self, feature: usize, value: f64) -> f64 {
        let (mean, sd) = match self.statistics(feature) {
            Some(stats) => stats,
            None => return value,
        };
        let scaled = if sd == 0.0 || sd < (mean * 0.001).abs() {
            if value == mean {
                0.0
            } else if value < mean {
                -1.0
            } else {
                1.0
            }
        } else {
            (value - mean) / sd
        };
        if scaled.is_nan() {
            0.0
        } else {
            scaled
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standardizes_observed_column() {
        let mut s = ZScoreScaler::new();
        s.observe(0, &[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(s.statistics(0), Some((5.0, 2.0)));
        assert!((s.scale(0, 9.0) - 2.0).abs() < 1e-12);
        assert!((s.scale(0, 3.0) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn constant_feature_maps_to_sign() {
        let mut s = ZScoreScaler::new();
        s.observe(1, &[3.0, 3.0, 3.0]);
        assert_eq!(s.scale(1, 3.0), 0.0);
        assert_eq!(s.scale(1, 10.0), 1.0);
        assert_eq!(s.scale(1, -2.0), -1.0);
        // feature 0 was never observed
        assert_eq!(s.scale(0, 42.0), 42.0);
    }

    #[test]
    fn tiny_relative_deviation_maps_to_sign() {
        let mut s = ZScoreScaler::new();
        s.observe(0, &[1000.0, 1000.1]);
        assert_eq!(s.scale(0, 1000.1), 1.0);
    }

    #[test]
    fn nan_input_becomes_zero() {
        let mut s = ZScoreScaler::new();
        s.observe(0, &[0.0, 2.0]);
        assert_eq!(s.scale(0, f64::NAN), 0.0);
    }

    #[test]
    fn none_has_no_scaler() {
        assert!(Scaling::None.scaler().is_none());
        assert!(Scaling::ZScore.scaler().is_some());
    }
}
