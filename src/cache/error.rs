use thiserror::Error;

use crate::embedding::EmbeddingError;
use crate::ingest::IngestError;
use crate::vectordb::VectorDbError;

#[derive(Debug, Error)]
/// Errors returned by the semantic cache.
pub enum CacheError {
    /// The index backend could not serve the request.
    #[error("cache index unavailable: {0}")]
    IndexUnavailable(#[from] VectorDbError),

    /// A vector's length differs from the index dimension.
    #[error("embedding dimension mismatch: index expects {expected}, got {actual}")]
    DimensionMismatch {
        /// Index dimension.
        expected: usize,
        /// Offending vector length.
        actual: usize,
    },

    /// Embedding generation failed.
    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Loading or parsing a source document failed.
    #[error("ingestion failed: {0}")]
    Ingest(#[from] IngestError),

    /// Invalid configuration.
    #[error("configuration error: {reason}")]
    Config {
        /// Error message.
        reason: String,
    },
}

/// Convenience result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
