//! Deterministic stub embedder.
//!
//! Identical texts map to identical unit vectors; distinct texts map to effectively
//! uncorrelated vectors. Useful when no embedding endpoint is configured.

use async_trait::async_trait;
use tracing::debug;

use crate::hashing::hash_to_u64;

use super::{EmbeddingError, EmbeddingProvider, normalize};

/// Default stub embedding dimension.
pub const STUB_EMBEDDING_DIM: usize = 384;

#[derive(Debug, Clone)]
pub struct StubEmbedder {
    dim: usize,
}

impl Default for StubEmbedder {
    fn default() -> Self {
        Self::new(STUB_EMBEDDING_DIM)
    }
}

impl StubEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    pub fn embedding_dim(&self) -> usize {
        self.dim
    }

    /// Synchronous form of [`EmbeddingProvider::embed`].
    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        debug!(text_len = text.len(), "Generating stub embedding");

        let mut state = stub_seed(text);

        let mut embedding = Vec::with_capacity(self.dim);
        for _ in 0..self.dim {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            let value = ((state >> 32) as f32 / u32::MAX as f32) * 2.0 - 1.0;
            embedding.push(value);
        }

        normalize(&mut embedding);
        embedding
    }
}

/// Seed for the vector of `text`. Stable across builds, so stored stub vectors stay valid.
pub(crate) fn stub_seed(text: &str) -> u64 {
    hash_to_u64(text.as_bytes())
}

#[async_trait]
impl EmbeddingProvider for StubEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if self.dim == 0 {
            return Err(EmbeddingError::EmptyEmbedding);
        }
        Ok(self.embed_sync(text))
    }

    fn model_id(&self) -> &str {
        "stub"
    }
}
