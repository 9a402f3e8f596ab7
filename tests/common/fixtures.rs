//! Test fixtures for integration tests.

use std::sync::Arc;
use std::time::Duration;

use cagrag::cache::{SemanticCache, SemanticCacheConfig};
use cagrag::chain::{CacheChain, ChainConfig};
use cagrag::embedding::{EmbeddingProvider, MockEmbedder};
use cagrag::generation::{Generator, MockGenerator};
use cagrag::retrieval::{MockRetriever, Passage, RetrievalFallback};
use cagrag::vectordb::MockVectorDbClient;

/// Wide enough that unrelated stub vectors never clear the HIT threshold.
pub const EMBEDDING_DIM: usize = 64;

pub const GENERATED_ANSWER: &str = "수입신고는 물품 도착 후 30일 이내에 해야 합니다.";

pub fn customs_passages() -> Vec<Passage> {
    vec![
        Passage::new("관세법.pdf", "제241조 수출·수입 또는 반송의 신고"),
        Passage::new("고시.pdf", "보세구역 반입일부터 30일 이내에 수입신고를 하여야 한다."),
        Passage::new("FAQ.pdf", "신고 지연 시 가산세가 부과된다."),
    ]
}

pub struct TestChain {
    pub embedder: Arc<MockEmbedder>,
    pub retriever: Arc<MockRetriever>,
    pub generator: Arc<MockGenerator>,
    pub chain: Arc<CacheChain<MockVectorDbClient>>,
}

pub struct TestChainBuilder {
    dynamic_cache_size: usize,
    threshold: f32,
    generation_delay: Option<Duration>,
    passages: Vec<Passage>,
}

impl Default for TestChainBuilder {
    fn default() -> Self {
        Self {
            dynamic_cache_size: 5,
            threshold: 0.85,
            generation_delay: None,
            passages: customs_passages(),
        }
    }
}

impl TestChainBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dynamic_cache_size(mut self, size: usize) -> Self {
        self.dynamic_cache_size = size;
        self
    }

    pub fn threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn generation_delay(mut self, delay: Duration) -> Self {
        self.generation_delay = Some(delay);
        self
    }

    pub fn passages(mut self, passages: Vec<Passage>) -> Self {
        self.passages = passages;
        self
    }

    pub async fn build(self) -> TestChain {
        let embedder = Arc::new(MockEmbedder::new(EMBEDDING_DIM));
        let cache = SemanticCache::open(
            MockVectorDbClient::new(),
            Arc::clone(&embedder) as Arc<dyn EmbeddingProvider>,
            SemanticCacheConfig::default().dynamic_cache_size(self.dynamic_cache_size),
        )
        .await
        .expect("cache should open");

        let retriever = Arc::new(MockRetriever::with_passages(self.passages));
        let generator = Arc::new(MockGenerator::new(GENERATED_ANSWER));
        generator.set_delay(self.generation_delay);

        let chain = CacheChain::new(
            Arc::new(cache),
            Arc::clone(&retriever) as Arc<dyn RetrievalFallback>,
            Arc::clone(&generator) as Arc<dyn Generator>,
            ChainConfig::default().threshold(self.threshold),
        )
        .expect("chain should build");

        TestChain {
            embedder,
            retriever,
            generator,
            chain: Arc::new(chain),
        }
    }
}

/// Unit vector along axis `i`.
pub fn basis(i: usize) -> Vec<f32> {
    let mut v = vec![0.0; EMBEDDING_DIM];
    v[i] = 1.0;
    v
}

/// Unit vector with cosine `similarity` to `basis(i)`, tilted towards `basis(j)`.
pub fn near(i: usize, j: usize, similarity: f32) -> Vec<f32> {
    let mut v = vec![0.0; EMBEDDING_DIM];
    v[i] = similarity;
    v[j] = (1.0 - similarity * similarity).sqrt();
    v
}
