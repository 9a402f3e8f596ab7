//! Document retrieval used when the cache misses.

pub mod elasticsearch;
mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;


use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use elasticsearch::{ElasticsearchConfig, ElasticsearchRetriever};
pub use error::RetrievalError;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockRetriever;

/// A supporting passage and the label of the document it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    pub source: String,
    pub content: String,
}

impl Passage {
    pub fn new(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            content: content.into(),
        }
    }
}

/// Query → ranked passages, best first. An empty result means nothing relevant was found.
#[async_trait]
pub trait RetrievalFallback: Send + Sync {
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<Passage>, RetrievalError>;
}
