//! Error types for progress storage.

use thiserror::Error;

/// Result type for progress operations.
pub type ProgressResult<T> = Result<T, ProgressError>;

/// Errors that can occur while reading or writing progress.
#[derive(Debug, Error)]
pub enum ProgressError {
    /// The storage medium failed to read.
    #[error("failed to read progress from {location}: {source}")]
    Read {
        /// Where the medium lives (path or a label).
        location: String,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The storage medium failed to write.
    #[error("failed to write progress to {location}: {source}")]
    Write {
        /// Where the medium lives (path or a label).
        location: String,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// A record could not be serialized.
    #[error("failed to serialize progress record: {0}")]
    Serialize(#[from] serde_json::Error),
}
