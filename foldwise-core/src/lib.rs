//! Shared primitives for the foldwise classifier evaluation engine.
//!
//! `foldwise-core` provides the foundation the evaluation crate builds on:
//!
//! - **Error types**: [`FoldwiseError`] and [`Result`] for structured error handling
//! - **Traits**: Small reporting abstractions like [`Summarizable`] and [`Scored`]

pub mod error;
pub mod traits;

pub use error::{FoldwiseError, Result};
pub use traits::*;
