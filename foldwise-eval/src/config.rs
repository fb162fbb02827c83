//! Run configuration for [`CrossValidation::run`](crate::CrossValidation::run).
//!
//! ```
//! use foldwise_eval::config::{CvConfig, CvMode};
//!
//! let config = CvConfig { mode: CvMode::LeaveOneOut, ..Default::default() };
//! assert!(config.validate().is_ok());
//! ```

use foldwise_core::{FoldwiseError, Result};

use crate::folds::DEFAULT_MAX_ATTEMPTS;
use crate::scaling::Scaling;

/// Evaluation protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CvMode {
    /// Train on everything, evaluate on the same instances.
    TrainEvaluate,
    /// One held-out instance per round.
    LeaveOneOut,
    /// Repeated stratified k-fold.
    #[default]
    KFold,
}

/// Configuration for an evaluation run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CvConfig {
    /// Protocol to run (default: k-fold).
    pub mode: CvMode,
    /// Number of folds for k-fold (default: 10).
    pub folds: usize,
    /// Number of k-fold repeats (default: 1).
    pub repeats: usize,
    /// Seed of the fold-assignment random source (default: 42).
    pub seed: u64,
    /// Permutations tried per fold assignment before giving up (default: 10 000).
    pub max_assignment_attempts: usize,
    /// Extra performance measures, e.g. `["auc", "mat"]`.
    pub measures: Vec<String>,
    /// Per-split feature scaling (default: none).
    pub scaling: Scaling,
    /// Field separator of the rendered report (default: tab).
    pub delimiter: char,
}

impl Default for CvConfig {
    fn default() -> Self {
        Self {
            mode: CvMode::KFold,
            folds: 10,
            repeats: 1,
            seed: 42,
            max_assignment_attempts: DEFAULT_MAX_ATTEMPTS,
            measures: Vec::new(),
            scaling: Scaling::None,
            delimiter: '\t',
        }
    }
}

impl CvConfig {
    /// Check the numeric fields.
    ///
    /// # Errors
    ///
    /// Returns an error if `folds`, `repeats` or `max_assignment_attempts`
    /// is zero, or if k-fold is selected with fewer than 2 folds.
    pub fn validate(&self) -> Result<()> {
        if self.folds == 0 {
            return Err(FoldwiseError::InvalidInput("folds must be > 0".into()));
        }
        if self.mode == CvMode::KFold && self.folds < 2 {
            return Err(FoldwiseError::InvalidInput(
                "k-fold needs at least 2 folds".into(),
            ));
        }
        if self.repeats == 0 {
            return Err(FoldwiseError::InvalidInput("repeats must be > 0".into()));
        }
        if self.max_assignment_attempts == 0 {
            return Err(FoldwiseError::InvalidInput(
                "max_assignment_attempts must be > 0".into(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration. Missing fields take their
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns `Parse` on malformed JSON and `InvalidInput` if validation
    /// fails.
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self> {
        let config: CvConfig =
            serde_json::from_str(json).map_err(|e| FoldwiseError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}
