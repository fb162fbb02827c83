//! Structured error types for the foldwise evaluation engine.

use thiserror::Error;

/// Unified error type for all foldwise operations.
#[derive(Debug, Error)]
pub enum FoldwiseError {
    /// I/O error (file not found, permission denied, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error (malformed configuration or input data)
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid input (bad arguments, out-of-range values, malformed requests)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No stratified fold assignment exists (or none was found within budget)
    #[error("infeasible partition: {0}")]
    InfeasiblePartition(String),

    /// The classifier failed to train or predict
    #[error("training failed: {0}")]
    Training(String),

    /// The statistics service was unreachable or failed to compute a measure
    #[error("statistics service error: {0}")]
    StatisticsService(String),

    /// Catch-all for other errors
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the foldwise crates.
pub type Result<T> = std::result::Result<T, FoldwiseError>;
