use std::fmt::Write;
use std::sync::Arc;

use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use crate::cache::{CacheLookup, SemanticCache};
use crate::config::ConfigError;
use crate::generation::{GenerationError, Generator};
use crate::retrieval::{Passage, RetrievalFallback};
use crate::vectordb::VectorDbClient;

use super::config::{ChainConfig, ChainMessages};
use super::types::{AnswerSource, ChainOutcome, ChainRequest, ChainResponse};

/// Cache-first answering chain over a [`SemanticCache`], a retrieval fallback and a generator.
///
/// Safe to share across tasks behind an `Arc`; concurrent invocations only contend on the
/// cache's eviction window during write-back.
pub struct CacheChain<B: VectorDbClient> {
    cache: Arc<SemanticCache<B>>,
    retriever: Arc<dyn RetrievalFallback>,
    generator: Arc<dyn Generator>,
    config: ChainConfig,
    messages: ChainMessages,
}

impl<B: VectorDbClient> std::fmt::Debug for CacheChain<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheChain")
            .field("cache", &self.cache)
            .field("generator", &self.generator.model_id())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<B: VectorDbClient> CacheChain<B> {
    pub fn new(
        cache: Arc<SemanticCache<B>>,
        retriever: Arc<dyn RetrievalFallback>,
        generator: Arc<dyn Generator>,
        config: ChainConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            cache,
            retriever,
            generator,
            config,
            messages: ChainMessages::default(),
        })
    }

    pub fn with_messages(mut self, messages: ChainMessages) -> Self {
        self.messages = messages;
        self
    }

    pub fn cache(&self) -> &Arc<SemanticCache<B>> {
        &self.cache
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn messages(&self) -> &ChainMessages {
        &self.messages
    }

    pub async fn invoke(&self, request: &ChainRequest) -> ChainResponse {
        self.answer(&request.question).await
    }

    #[instrument(skip(self, question), fields(question_len = question.len()))]
    pub async fn answer(&self, question: &str) -> ChainResponse {
        let question = question.trim();
        if question.is_empty() {
            return self.finish(ChainResponse::new(
                self.messages.empty_question.clone(),
                AnswerSource::None,
                ChainOutcome::EmptyQuestion,
            ));
        }

        // Embedded once; reused by the write-back.
        let embedding = match self.cache.embed(question).await {
            Ok(vector) => Some(vector),
            Err(e) => {
                warn!(error = %e, "Question embedding failed; skipping cache lookup");
                None
            }
        };

        if let Some(vector) = &embedding {
            let lookup = self
                .cache
                .lookup_vector(vector, self.config.cache_top_k, self.config.threshold)
                .await;
            if let CacheLookup::Hit(hit) = lookup {
                return self.finish(ChainResponse::new(
                    hit.text,
                    AnswerSource::Cag,
                    ChainOutcome::Hit {
                        key: hit.key,
                        similarity: hit.similarity,
                    },
                ));
            }
        }

        let passages = self.retrieve(question).await;
        if passages.is_empty() {
            return self.finish(ChainResponse::new(
                self.messages.no_documents.clone(),
                AnswerSource::None,
                ChainOutcome::NoDocs,
            ));
        }

        let context = format_context(&passages);
        let answer = match self.generate(question, &context).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!(error = %e, model = self.generator.model_id(), "Generation failed");
                return self.finish(ChainResponse::new(
                    self.messages.for_generation_error(&e),
                    AnswerSource::Rag,
                    ChainOutcome::GenerationFailed,
                ));
            }
        };

        let saved = match embedding {
            Some(vector) => {
                self.cache
                    .save_dynamic_with_embedding(question, &answer, vector)
                    .await
            }
            None => self.cache.save_dynamic(question, &answer).await,
        };
        let cache_key = match saved {
            Ok(key) => Some(key),
            Err(e) => {
                warn!(error = %e, "Cache write-back failed; answer still returned");
                None
            }
        };

        self.finish(ChainResponse::new(
            answer,
            AnswerSource::Rag,
            ChainOutcome::Answered { cache_key },
        ))
    }

    async fn retrieve(&self, question: &str) -> Vec<Passage> {
        let search = self.retriever.search(question, self.config.retrieval_top_k);
        match timeout(self.config.retrieval_timeout, search).await {
            Ok(Ok(passages)) => {
                debug!(passages = passages.len(), "Retrieval complete");
                passages
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Retrieval failed");
                Vec::new()
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.config.retrieval_timeout.as_millis() as u64,
                    "Retrieval timed out"
                );
                Vec::new()
            }
        }
    }

    async fn generate(&self, question: &str, context: &str) -> Result<String, GenerationError> {
        let call = self.generator.generate(question, context);
        let answer = match timeout(self.config.generation_timeout, call).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(GenerationError::Timeout {
                    millis: self.config.generation_timeout.as_millis() as u64,
                });
            }
        };

        let answer = answer.trim();
        if answer.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(answer.to_string())
    }

    fn finish(&self, response: ChainResponse) -> ChainResponse {
        info!(
            outcome = response.outcome.as_str(),
            source = %response.source,
            cache_hit = response.cache_hit,
            "Chain finished"
        );
        response
    }
}

/// Renders passages as numbered, source-labeled blocks for the generator.
pub fn format_context(passages: &[Passage]) -> String {
    let mut context = String::new();
    for (i, passage) in passages.iter().enumerate() {
        let _ = writeln!(
            context,
            "--- Document {} (source: {}) ---\n{}",
            i + 1,
            passage.source,
            passage.content
        );
    }
    context
}
