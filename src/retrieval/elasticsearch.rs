//! Elasticsearch kNN retriever over a pre-indexed document corpus.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use crate::embedding::EmbeddingProvider;

use super::{Passage, RetrievalError, RetrievalFallback};

/// Label used when a hit carries no `source` field.
pub const UNKNOWN_SOURCE: &str = "unknown";

#[derive(Debug, Clone)]
pub struct ElasticsearchConfig {
    /// Elasticsearch URL, e.g. `http://localhost:9200`.
    pub url: String,
    pub index: String,
    /// `dense_vector` field searched with kNN.
    pub vector_field: String,
    pub source_field: String,
    pub content_field: String,
    /// Candidates considered per shard.
    pub num_candidates: usize,
}

impl ElasticsearchConfig {
    pub fn new(url: impl Into<String>, index: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            index: index.into(),
            vector_field: "content_vector".to_string(),
            source_field: "source".to_string(),
            content_field: "content".to_string(),
            num_candidates: 10,
        }
    }

    pub fn with_vector_field(mut self, field: impl Into<String>) -> Self {
        self.vector_field = field.into();
        self
    }

    pub fn with_num_candidates(mut self, num_candidates: usize) -> Self {
        self.num_candidates = num_candidates;
        self
    }

    pub fn validate(&self) -> Result<(), RetrievalError> {
        if self.url.trim().is_empty() {
            return Err(RetrievalError::InvalidConfig {
                reason: "url must not be empty".to_string(),
            });
        }
        if self.index.trim().is_empty() {
            return Err(RetrievalError::InvalidConfig {
                reason: "index must not be empty".to_string(),
            });
        }
        if self.num_candidates == 0 {
            return Err(RetrievalError::InvalidConfig {
                reason: "num_candidates must be > 0".to_string(),
            });
        }
        Ok(())
    }

    fn search_url(&self) -> String {
        format!("{}/{}/_search", self.url.trim_end_matches('/'), self.index)
    }
}

/// Embeds the query and runs a kNN search against `content_vector`.
pub struct ElasticsearchRetriever {
    config: ElasticsearchConfig,
    client: reqwest::Client,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl std::fmt::Debug for ElasticsearchRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElasticsearchRetriever")
            .field("config", &self.config)
            .field("embedder", &self.embedder.model_id())
            .finish_non_exhaustive()
    }
}

impl ElasticsearchRetriever {
    pub fn new(
        config: ElasticsearchConfig,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self, RetrievalError> {
        config.validate()?;
        Ok(Self {
            config,
            client: reqwest::Client::new(),
            embedder,
        })
    }

    pub fn config(&self) -> &ElasticsearchConfig {
        &self.config
    }
}

#[async_trait]
impl RetrievalFallback for ElasticsearchRetriever {
    #[instrument(skip(self, query), fields(index = %self.config.index, query_len = query.len()))]
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<Passage>, RetrievalError> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let vector = self.embedder.embed(query).await?;
        let body = build_search_body(&self.config, &vector, top_k);

        let response = self
            .client
            .post(self.config.search_url())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(RetrievalError::RequestFailed {
                reason: format!("HTTP {status}: {text}"),
            });
        }

        let parsed: Value =
            serde_json::from_str(&text).map_err(|e| RetrievalError::InvalidResponse {
                reason: e.to_string(),
            })?;
        let passages = parse_hits(&self.config, &parsed)?;

        debug!(passages = passages.len(), "Passages retrieved");
        Ok(passages)
    }
}

pub(crate) fn build_search_body(config: &ElasticsearchConfig, vector: &[f32], top_k: usize) -> Value {
    json!({
        "size": top_k,
        "knn": {
            "field": config.vector_field,
            "query_vector": vector,
            "k": top_k,
            "num_candidates": config.num_candidates.max(top_k),
        },
        "_source": [config.source_field, config.content_field],
    })
}

/// Hits without a content field are skipped.
pub(crate) fn parse_hits(
    config: &ElasticsearchConfig,
    body: &Value,
) -> Result<Vec<Passage>, RetrievalError> {
    let hits = body
        .get("hits")
        .and_then(|h| h.get("hits"))
        .and_then(|h| h.as_array())
        .ok_or_else(|| RetrievalError::InvalidResponse {
            reason: "missing 'hits.hits' array".to_string(),
        })?;

    Ok(hits
        .iter()
        .filter_map(|hit| {
            let source = hit.get("_source")?;
            let content = source.get(&config.content_field)?.as_str()?;
            let label = source
                .get(&config.source_field)
                .and_then(|s| s.as_str())
                .unwrap_or(UNKNOWN_SOURCE);
            Some(Passage::new(label, content))
        })
        .collect())
}
