//! Scripted retriever for tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{Passage, RetrievalError, RetrievalFallback};

#[derive(Debug, Default)]
pub struct MockRetriever {
    passages: RwLock<Vec<Passage>>,
    failing: AtomicBool,
    delay: RwLock<Option<Duration>>,
    calls: AtomicUsize,
    last_query: RwLock<Option<String>>,
}

impl MockRetriever {
    /// A retriever that finds nothing.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_passages(passages: Vec<Passage>) -> Self {
        let retriever = Self::default();
        retriever.set_passages(passages);
        retriever
    }

    pub fn set_passages(&self, passages: Vec<Passage>) {
        *self.passages.write() = passages;
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

    pub fn last_query(&self) -> Option<String> {
        self.last_query.read().clone()
    }
}

#[async_trait]
impl RetrievalFallback for MockRetriever {
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<Passage>, RetrievalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_query.write() = Some(query.to_string());

        let delay = *self.delay.read();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(RetrievalError::RequestFailed {
                reason: "mock retriever failure".to_string(),
            });
        }

        Ok(self.passages.read().iter().take(top_k).cloned().collect())
    }
}
