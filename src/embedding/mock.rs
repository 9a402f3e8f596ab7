//! Controllable embedder for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{EmbeddingError, EmbeddingProvider, StubEmbedder, normalize};

/// Returns pinned vectors for chosen texts and stub vectors for everything else.
///
/// Failure and latency can be switched on to exercise degraded paths.
#[derive(Debug, Default)]
pub struct MockEmbedder {
    stub: StubEmbedder,
    pinned: RwLock<HashMap<String, Vec<f32>>>,
    failing: AtomicBool,
    delay: RwLock<Option<Duration>>,
    calls: AtomicUsize,
}

impl MockEmbedder {
    pub fn new(dim: usize) -> Self {
        Self {
            stub: StubEmbedder::new(dim),
            ..Default::default()
        }
    }

    pub fn embedding_dim(&self) -> usize {
        self.stub.embedding_dim()
    }

    /// Pins `text` to `vector` (normalized on insert).
    pub fn pin(&self, text: &str, mut vector: Vec<f32>) {
        normalize(&mut vector);
        self.pinned.write().insert(text.to_string(), vector);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.write() = delay;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.read();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(EmbeddingError::RequestFailed {
                reason: "mock embedder failure".to_string(),
            });
        }

        if let Some(vector) = self.pinned.read().get(text) {
            return Ok(vector.clone());
        }

        Ok(self.stub.embed_sync(text))
    }

    fn model_id(&self) -> &str {
        "mock"
    }
}

/// Builds a `dim`-sized vector that has cosine similarity `similarity` with the first axis.
///
/// Pair with [`axis`] to pin two texts at a known similarity.
pub fn vector_with_similarity(dim: usize, similarity: f32) -> Vec<f32> {
    assert!(dim >= 2, "need at least two dimensions");
    let similarity = similarity.clamp(-1.0, 1.0);
    let mut v = vec![0.0; dim];
    v[0] = similarity;
    v[1] = (1.0 - similarity * similarity).max(0.0).sqrt();
    v
}

/// Unit vector along the first axis.
pub fn axis(dim: usize) -> Vec<f32> {
    let mut v = vec![0.0; dim];
    v[0] = 1.0;
    v
}
