use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
/// Errors returned while loading documents or building question patterns.
pub enum IngestError {
    /// Reading a file failed.
    #[error("failed to read '{path}': {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// PDF text extraction failed.
    #[error("failed to extract text from '{path}': {reason}")]
    Pdf {
        /// File path.
        path: PathBuf,
        /// Error message.
        reason: String,
    },

    /// A JSON page file did not have the expected shape.
    #[error("invalid page file '{path}': {reason}")]
    InvalidPageFile {
        /// File path.
        path: PathBuf,
        /// Error message.
        reason: String,
    },

    /// A question-pattern fragment is not a valid regex.
    #[error("invalid question pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// Offending fragment.
        pattern: String,
        /// Error message.
        reason: String,
    },

    /// The question-pattern catalogue had no fragments.
    #[error("question pattern catalogue is empty")]
    EmptyPatternCatalogue,

    /// A blocking extraction task did not complete.
    #[error("extraction task failed: {reason}")]
    TaskFailed {
        /// Error message.
        reason: String,
    },
}
