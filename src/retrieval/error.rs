use thiserror::Error;

use crate::embedding::EmbeddingError;

#[derive(Debug, Error)]
/// Errors returned by retrieval backends.
pub enum RetrievalError {
    /// The query could not be embedded.
    #[error("query embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    /// The search request failed.
    #[error("search request failed: {reason}")]
    RequestFailed { reason: String },

    /// The backend answered with something unparseable.
    #[error("invalid search response: {reason}")]
    InvalidResponse { reason: String },

    /// The search did not complete in time.
    #[error("retrieval timed out after {millis} ms")]
    Timeout { millis: u64 },

    /// Invalid configuration.
    #[error("invalid retriever configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl From<reqwest::Error> for RetrievalError {
    fn from(err: reqwest::Error) -> Self {
        RetrievalError::RequestFailed {
            reason: err.to_string(),
        }
    }
}
