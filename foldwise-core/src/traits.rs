//! Reporting traits shared by the foldwise crates.

/// Something evaluated down to one number, e.g. a fold scored by its F1.
pub trait Scored {
    fn score(&self) -> f64;
}

/// One-line, human-readable digest of an evaluation artifact.
pub trait Summarizable {
    fn summary(&self) -> String;
}
