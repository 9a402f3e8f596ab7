use std::time::Duration;

use crate::config::{Config, ConfigError};
use crate::constants::{
    DEFAULT_CACHE_TOP_K, DEFAULT_CHAIN_THRESHOLD, DEFAULT_GENERATION_TIMEOUT_MS,
    DEFAULT_RETRIEVAL_TIMEOUT_MS, DEFAULT_RETRIEVAL_TOP_K,
};
use crate::generation::GenerationError;

#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// Similarity at or above which the cache answers.
    pub threshold: f32,
    pub cache_top_k: usize,
    pub retrieval_top_k: usize,
    pub retrieval_timeout: Duration,
    pub generation_timeout: Duration,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_CHAIN_THRESHOLD,
            cache_top_k: DEFAULT_CACHE_TOP_K,
            retrieval_top_k: DEFAULT_RETRIEVAL_TOP_K,
            retrieval_timeout: Duration::from_millis(DEFAULT_RETRIEVAL_TIMEOUT_MS),
            generation_timeout: Duration::from_millis(DEFAULT_GENERATION_TIMEOUT_MS),
        }
    }
}

impl ChainConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            threshold: config.similarity_threshold,
            cache_top_k: config.cache_top_k,
            retrieval_top_k: config.retrieval_top_k,
            retrieval_timeout: config.retrieval_timeout,
            generation_timeout: config.generation_timeout,
        }
    }

    pub fn threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn cache_top_k(mut self, k: usize) -> Self {
        self.cache_top_k = k;
        self
    }

    pub fn retrieval_top_k(mut self, k: usize) -> Self {
        self.retrieval_top_k = k;
        self
    }

    pub fn retrieval_timeout(mut self, timeout: Duration) -> Self {
        self.retrieval_timeout = timeout;
        self
    }

    pub fn generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ConfigError::OutOfRange {
                name: "threshold",
                reason: format!("{} is not within [0, 1]", self.threshold),
            });
        }
        if self.cache_top_k == 0 {
            return Err(ConfigError::OutOfRange {
                name: "cache_top_k",
                reason: "must be > 0".to_string(),
            });
        }
        if self.retrieval_top_k == 0 {
            return Err(ConfigError::OutOfRange {
                name: "retrieval_top_k",
                reason: "must be > 0".to_string(),
            });
        }
        if self.retrieval_timeout.is_zero() || self.generation_timeout.is_zero() {
            return Err(ConfigError::OutOfRange {
                name: "timeout",
                reason: "timeouts must be > 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Fixed user-visible strings for the terminal non-answer states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainMessages {
    pub empty_question: String,
    pub no_documents: String,
    pub generation_timeout: String,
    pub generation_unavailable: String,
    pub generation_failed: String,
}

impl Default for ChainMessages {
    fn default() -> Self {
        Self {
            empty_question: "질문을 입력해주세요.".to_string(),
            no_documents: "죄송합니다. 질문에 대한 관련 문서를 검색할 수 없습니다.".to_string(),
            generation_timeout: "❌ 응답 시간을 초과했습니다. 잠시 후 다시 시도해주세요."
                .to_string(),
            generation_unavailable:
                "❌ 답변 생성 서버에 연결할 수 없습니다. 서버가 실행 중인지 확인하세요."
                    .to_string(),
            generation_failed: "❌ 답변 생성 중 오류가 발생했습니다.".to_string(),
        }
    }
}

impl ChainMessages {
    pub fn for_generation_error(&self, error: &GenerationError) -> &str {
        match error {
            GenerationError::Timeout { .. } => &self.generation_timeout,
            GenerationError::Connection { .. } => &self.generation_unavailable,
            GenerationError::Provider { .. } | GenerationError::EmptyResponse => {
                &self.generation_failed
            }
        }
    }
}
