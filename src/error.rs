//! Error types for cohort reads.

use thiserror::Error;

/// Result type for cohort reader operations.
pub type ReadResult<T> = std::result::Result<T, ReadError>;

/// Failures a cohort reader can report to the engine.
///
/// The engine never retries; these propagate to the caller unchanged.
#[derive(Error, Debug)]
pub enum ReadError {
    /// Requested sample does not exist in the snapshot
    #[error("Sample not found: {0}")]
    SampleNotFound(String),

    /// Backing source could not produce rows
    #[allow(dead_code)] // Raised by readers over external stores
    #[error("Cohort source unavailable: {0}")]
    Unavailable(String),
}
