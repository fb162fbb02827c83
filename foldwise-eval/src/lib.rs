//! Performance evaluation of binary classifiers for the foldwise engine.
//!
//! Provides repeated stratified k-fold, leave-one-out and train/evaluate
//! protocols over any [`Classifier`] backend, aggregating contingency-table
//! statistics, per-fold F1 and ROC AUC into a tabular [`PerformanceReport`].
//!
//! # Quick start
//!
//! ```
//! use std::sync::Arc;
//!
//! use foldwise_eval::{AucEvaluator, CrossValidation, DenseProblem, LocalStatistics, NearestCentroid};
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let mut problem = DenseProblem::new(1);
//! for i in 0..6 {
//!     problem.add_instance(-1.0, &[i as f64 * 0.1]).unwrap();
//!     problem.add_instance(1.0, &[5.0 + i as f64 * 0.1]).unwrap();
//! }
//!
//! let evaluator = AucEvaluator::new(Arc::new(LocalStatistics::default()));
//! let cv = CrossValidation::new(NearestCentroid::new(1), problem, evaluator);
//! let report = cv.k_fold(3, 2, &mut StdRng::seed_from_u64(42)).unwrap();
//! assert!((report.accuracy() - 100.0).abs() < 1e-12);
//! assert!((report.roc_auc() - 1.0).abs() < 1e-12);
//! ```

pub mod auc;
pub mod centroid;
pub mod config;
pub mod contingency;
pub mod cross_validation;
pub mod folds;
pub mod labels;
pub mod measure;
pub mod problem;
pub mod report;
pub mod roc;
pub mod scaling;
pub mod stats_service;

pub use auc::AucEvaluator;
pub use centroid::{CentroidModel, NearestCentroid};
pub use config::{CvConfig, CvMode};
pub use contingency::ContingencyTable;
pub use cross_validation::{test_set_evaluation, CrossValidation};
pub use folds::{FoldAssigner, FoldAssignment};
pub use measure::{EvaluationMeasure, NativeMeasure};
pub use problem::{Classifier, DenseProblem, Problem};
pub use report::{FoldOutcome, PerformanceReport, TabularReport};
pub use roc::PerformanceMeasure;
pub use scaling::{FeatureScaler, Scaling, ZScoreScaler};
pub use stats_service::{ConnectionPool, LocalStatistics, PooledConnection, StatisticsConnection};
