//! Error types for scene script loading and validation.

use thiserror::Error;

/// Result type for script operations.
pub type ScriptResult<T> = Result<T, ScriptError>;

/// Errors that can occur while loading or validating a scene script.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The script file could not be read.
    #[error("failed to read script {path}: {source}")]
    Read {
        /// Path that was being read.
        path: String,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The script payload is not valid JSON or does not match the schema.
    #[error("malformed scene script: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Validation found errors (see the rendered diagnostics).
    #[error("script has {0} validation error(s)")]
    Invalid(usize),
}
