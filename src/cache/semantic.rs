use std::path::Path;
use std::sync::Arc;

use futures_util::{StreamExt, TryStreamExt, stream};
use tracing::{debug, info, instrument, warn};

use crate::constants::DIMENSION_SAMPLE_TEXT;
use crate::embedding::{EmbeddingError, EmbeddingProvider};
use crate::hashing::{dynamic_cache_key, pre_cache_key};
use crate::ingest::{DocumentIngestor, DocumentPage, QaPair, load_document};
use crate::vectordb::VectorDbClient;

use super::config::SemanticCacheConfig;
use super::error::CacheResult;
use super::index::SemanticCacheIndex;
use super::types::{CacheEntry, CacheLookup, CacheOrigin, MissReason};
use super::window::EvictionWindow;

/// Concurrent embedding requests while pre-caching.
const PRE_CACHE_EMBED_CONCURRENCY: usize = 8;

/// Semantic cache: an index, its dynamic eviction window and the embedder that feeds both.
///
/// Lookups never fail; every collaborator error degrades to a miss.
pub struct SemanticCache<B: VectorDbClient> {
    index: SemanticCacheIndex<B>,
    window: EvictionWindow,
    embedder: Arc<dyn EmbeddingProvider>,
    ingestor: DocumentIngestor,
    config: SemanticCacheConfig,
}

impl<B: VectorDbClient> std::fmt::Debug for SemanticCache<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticCache")
            .field("index", &self.index)
            .field("window", &self.window)
            .field("embedder", &self.embedder.model_id())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<B: VectorDbClient> SemanticCache<B> {
    /// Embeds a sample text to learn the vector dimension and opens the index with it.
    ///
    /// Dynamic entries left in a reused index are replayed into the window, oldest first,
    /// so at most `dynamic_cache_size` of them survive the open.
    pub async fn open(
        backend: B,
        embedder: Arc<dyn EmbeddingProvider>,
        config: SemanticCacheConfig,
    ) -> CacheResult<Self> {
        config.validate()?;

        let sample = embed_with_timeout(embedder.as_ref(), DIMENSION_SAMPLE_TEXT, &config).await?;
        let dimension = sample.len();
        info!(
            model = embedder.model_id(),
            dimension, "Embedding dimension detected"
        );

        let index = SemanticCacheIndex::open(
            backend,
            &config.collection,
            dimension,
            config.force_recreate,
        )
        .await?;

        let window = EvictionWindow::new(config.dynamic_cache_size);
        let resident = index.dynamic_keys().await?;
        if !resident.is_empty() {
            let evicted = window.restore(resident, &index).await;
            info!(
                restored = window.len().await,
                evicted = evicted.len(),
                "Dynamic entries from a previous run restored into the window"
            );
        }

        Ok(Self {
            index,
            window,
            embedder,
            ingestor: DocumentIngestor::default(),
            config,
        })
    }

    /// Replaces the ingestor used by the `pre_cache_*` methods.
    pub fn with_ingestor(mut self, ingestor: DocumentIngestor) -> Self {
        self.ingestor = ingestor;
        self
    }

    pub fn index(&self) -> &SemanticCacheIndex<B> {
        &self.index
    }

    pub fn window(&self) -> &EvictionWindow {
        &self.window
    }

    pub fn config(&self) -> &SemanticCacheConfig {
        &self.config
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// Embeds `text`, bounded by the configured embedding timeout.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        embed_with_timeout(self.embedder.as_ref(), text, &self.config).await
    }

    /// Lookup with the configured k and threshold.
    pub async fn check(&self, query: &str) -> CacheLookup {
        self.check_with(query, self.config.top_k, self.config.threshold)
            .await
    }

    #[instrument(skip(self, query), fields(query_len = query.len()))]
    pub async fn check_with(&self, query: &str, k: usize, threshold: f32) -> CacheLookup {
        match self.embed(query).await {
            Ok(vector) => self.lookup_vector(&vector, k, threshold).await,
            Err(e) => {
                warn!(error = %e, "Query embedding failed; treating as miss");
                CacheLookup::Miss(MissReason::EmbeddingFailed)
            }
        }
    }

    /// Lookup for an already-embedded query.
    pub async fn lookup_vector(&self, vector: &[f32], k: usize, threshold: f32) -> CacheLookup {
        let matches = match self.index.nearest_neighbors(vector, k).await {
            Ok(matches) => matches,
            Err(e) => {
                warn!(error = %e, "Cache index unavailable; treating as miss");
                return CacheLookup::Miss(MissReason::IndexUnavailable);
            }
        };

        let lookup = CacheLookup::from_matches(&matches, threshold);
        match &lookup {
            CacheLookup::Hit(hit) => debug!(
                key = %hit.key,
                similarity = hit.similarity,
                origin = ?hit.origin,
                "Cache hit"
            ),
            CacheLookup::Miss(reason) => debug!(reason = reason.as_str(), threshold, "Cache miss"),
        }
        lookup
    }

    /// Stores `answer` for `query` as a dynamic entry. Returns the entry key.
    pub async fn save_dynamic(&self, query: &str, answer: &str) -> CacheResult<String> {
        let embedding = self.embed(query).await?;
        self.save_dynamic_with_embedding(query, answer, embedding)
            .await
    }

    /// [`save_dynamic`](Self::save_dynamic) with a precomputed query embedding.
    #[instrument(skip_all)]
    pub async fn save_dynamic_with_embedding(
        &self,
        query: &str,
        answer: &str,
        embedding: Vec<f32>,
    ) -> CacheResult<String> {
        let key = dynamic_cache_key(query);
        let entry = CacheEntry::new(key.clone(), embedding, answer, CacheOrigin::Dynamic)
            .with_question(query);

        let evicted = self.window.write_through(entry, &self.index).await?;
        info!(key = %key, evicted = ?evicted, "Dynamic cache entry saved");
        Ok(key)
    }

    /// Bulk-inserts `pairs` as pre-cached entries keyed by `source` and position.
    #[instrument(skip(self, pairs), fields(pairs = pairs.len()))]
    pub async fn pre_cache(&self, pairs: &[QaPair], source: &str) -> CacheResult<usize> {
        if pairs.is_empty() {
            return Ok(0);
        }

        let embeddings: Vec<Vec<f32>> = stream::iter(pairs)
            .map(|pair| self.embed(&pair.question))
            .buffered(PRE_CACHE_EMBED_CONCURRENCY)
            .try_collect()
            .await?;

        let entries: Vec<CacheEntry> = pairs
            .iter()
            .zip(embeddings)
            .enumerate()
            .map(|(i, (pair, embedding))| {
                CacheEntry::new(
                    pre_cache_key(source, i),
                    embedding,
                    pair.answer.clone(),
                    CacheOrigin::PreCached,
                )
                .with_question(pair.question.clone())
            })
            .collect();

        let count = self.index.insert_batch(entries).await?;
        info!(count, source, "Pre-cache entries stored");
        Ok(count)
    }

    /// Extracts QA pairs from `pages` and pre-caches them.
    pub async fn pre_cache_pages(&self, pages: &[DocumentPage], source: &str) -> CacheResult<usize> {
        let pairs = self.ingestor.extract_pairs(pages);
        info!(pages = pages.len(), pairs = pairs.len(), source, "QA pairs extracted");
        self.pre_cache(&pairs, source).await
    }

    /// Loads a document from disk and pre-caches its QA pairs.
    pub async fn pre_cache_file(&self, path: &Path) -> CacheResult<usize> {
        let pages = load_document(path).await?;
        let source = path.to_string_lossy();
        self.pre_cache_pages(&pages, &source).await
    }

    pub async fn is_ready(&self) -> bool {
        self.index.is_ready().await
    }
}

async fn embed_with_timeout(
    embedder: &dyn EmbeddingProvider,
    text: &str,
    config: &SemanticCacheConfig,
) -> Result<Vec<f32>, EmbeddingError> {
    match tokio::time::timeout(config.embed_timeout, embedder.embed(text)).await {
        Ok(result) => result,
        Err(_) => Err(EmbeddingError::Timeout {
            millis: config.embed_timeout.as_millis() as u64,
        }),
    }
}
