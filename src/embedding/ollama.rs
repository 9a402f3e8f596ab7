//! Ollama-compatible HTTP embedder.

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use super::{EmbeddingError, EmbeddingProvider};

#[derive(Debug, Clone)]
/// Configuration for [`OllamaEmbedder`].
pub struct OllamaEmbedderConfig {
    /// Base URL, e.g. `http://localhost:11434`.
    pub base_url: String,
    /// Embedding model name.
    pub model: String,
}

impl OllamaEmbedderConfig {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    pub fn validate(&self) -> Result<(), EmbeddingError> {
        if self.base_url.trim().is_empty() {
            return Err(EmbeddingError::InvalidConfig {
                reason: "base_url must not be empty".to_string(),
            });
        }
        if self.model.trim().is_empty() {
            return Err(EmbeddingError::InvalidConfig {
                reason: "model must not be empty".to_string(),
            });
        }
        Ok(())
    }

    fn embed_url(&self) -> String {
        format!("{}/api/embed", self.base_url.trim_end_matches('/'))
    }
}

/// Embedder backed by `POST {base_url}/api/embed`.
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    config: OllamaEmbedderConfig,
    client: reqwest::Client,
}

impl OllamaEmbedder {
    pub fn new(config: OllamaEmbedderConfig) -> Result<Self, EmbeddingError> {
        config.validate()?;
        Ok(Self {
            config,
            client: reqwest::Client::new(),
        })
    }

    pub fn config(&self) -> &OllamaEmbedderConfig {
        &self.config
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    #[instrument(skip(self, text), fields(model = %self.config.model, text_len = text.len()))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let response = self
            .client
            .post(self.config.embed_url())
            .json(&json!({
                "model": self.config.model,
                "input": text,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::RequestFailed {
                reason: format!("HTTP {}: {}", status, body),
            });
        }

        let body: Value = response.json().await?;
        let embedding = parse_embed_response(&body)?;

        debug!(dim = embedding.len(), "Embedding received");
        Ok(embedding)
    }

    fn model_id(&self) -> &str {
        &self.config.model
    }
}

/// Extracts the first vector of an `/api/embed` response body.
pub(crate) fn parse_embed_response(body: &Value) -> Result<Vec<f32>, EmbeddingError> {
    let values = body
        .get("embeddings")
        .and_then(|e| e.as_array())
        .and_then(|arr| arr.first())
        .and_then(|e| e.as_array())
        .ok_or_else(|| EmbeddingError::InvalidResponse {
            reason: "missing 'embeddings' field".to_string(),
        })?;

    if values.is_empty() {
        return Err(EmbeddingError::EmptyEmbedding);
    }

    values
        .iter()
        .map(|v| {
            v.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| EmbeddingError::InvalidResponse {
                    reason: format!("non-numeric embedding component: {}", v),
                })
        })
        .collect()
}
