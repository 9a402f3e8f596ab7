//! Cagrag library crate (used by the binary and integration tests).
//!
//! # Public API Surface
//!
//! ## Cache
//! - [`SemanticCache`] - embed, look up, write back and pre-cache answers
//! - [`SemanticCacheIndex`], [`EvictionWindow`] - the vector index and its dynamic-entry window
//! - [`CacheLookup`], [`CacheHit`], [`MissReason`] - lookup results
//!
//! ## Orchestration
//! - [`CacheChain`], [`ChainConfig`], [`ChainResponse`] - cache-first answering with fallback
//!
//! ## Collaborators
//! - [`EmbeddingProvider`] with [`OllamaEmbedder`] and [`StubEmbedder`]
//! - [`RetrievalFallback`] with [`ElasticsearchRetriever`]
//! - [`Generator`] with [`GenaiGenerator`]
//! - [`VectorDbClient`] with [`QdrantClient`]
//!
//! ## Ingestion
//! - [`DocumentIngestor`], [`QuestionPattern`], [`load_document`] - QA pairs from documents
//!
//! ## Test/Mock Support
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod cache;
pub mod chain;
pub mod config;
pub mod constants;
pub mod embedding;
pub mod generation;
pub mod hashing;
pub mod ingest;
pub mod retrieval;
pub mod vectordb;

pub use cache::{
    CacheEntry, CacheError, CacheHit, CacheLookup, CacheMatch, CacheOrigin, CacheResult,
    EvictionWindow, MissReason, SemanticCache, SemanticCacheConfig, SemanticCacheIndex,
};
pub use chain::{
    AnswerSource, CacheChain, ChainConfig, ChainMessages, ChainOutcome, ChainRequest,
    ChainResponse, format_context,
};
pub use config::{Config, ConfigError};
pub use constants::{DEFAULT_CACHE_THRESHOLD, DEFAULT_CHAIN_THRESHOLD, DEFAULT_DYNAMIC_CACHE_SIZE};
#[cfg(any(test, feature = "mock"))]
pub use embedding::MockEmbedder;
pub use embedding::{
    EmbeddingError, EmbeddingProvider, OllamaEmbedder, OllamaEmbedderConfig, StubEmbedder,
};
#[cfg(any(test, feature = "mock"))]
pub use generation::MockGenerator;
pub use generation::{DEFAULT_SYSTEM_PROMPT, GenaiGenerator, GenerationError, Generator};
pub use hashing::{dynamic_cache_key, hash_to_u64, point_id_for_key, pre_cache_key};
pub use ingest::{
    DocumentIngestor, DocumentPage, IngestError, QaPair, QuestionPattern, load_document,
};
#[cfg(any(test, feature = "mock"))]
pub use retrieval::MockRetriever;
pub use retrieval::{
    ElasticsearchConfig, ElasticsearchRetriever, Passage, RetrievalError, RetrievalFallback,
};
#[cfg(any(test, feature = "mock"))]
pub use vectordb::MockVectorDbClient;
pub use vectordb::{QdrantClient, SearchResult, VectorDbClient, VectorDbError, VectorPoint};
