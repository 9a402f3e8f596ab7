//! Text embedding providers.
//!
//! - [`OllamaEmbedder`] calls an Ollama-compatible `/api/embed` endpoint.
//! - [`StubEmbedder`] produces deterministic hash-seeded vectors (no model needed).
//!
//! The same provider must serve ingestion and query-time embedding; mixing models
//! silently invalidates stored distances.

mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod ollama;
pub mod stub;

#[cfg(test)]
mod tests;

use async_trait::async_trait;

pub use error::EmbeddingError;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockEmbedder;
pub use ollama::{OllamaEmbedder, OllamaEmbedderConfig};
pub use stub::{STUB_EMBEDDING_DIM, StubEmbedder};

/// Text → fixed-dimension vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds a single string.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Short identifier of the model behind this provider (for logs).
    fn model_id(&self) -> &str;
}

/// Scales `embedding` to unit length in place (zero vectors are left untouched).
pub fn normalize(embedding: &mut [f32]) {
    let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm > 0.0 {
        for x in embedding.iter_mut() {
            *x /= norm;
        }
    }
}
