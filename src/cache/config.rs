use std::time::Duration;

use crate::config::Config;
use crate::constants::{
    DEFAULT_CACHE_COLLECTION, DEFAULT_CACHE_THRESHOLD, DEFAULT_CACHE_TOP_K,
    DEFAULT_DYNAMIC_CACHE_SIZE, DEFAULT_EMBED_TIMEOUT_MS,
};

use super::error::{CacheError, CacheResult};

#[derive(Debug, Clone)]
pub struct SemanticCacheConfig {
    pub top_k: usize,
    pub threshold: f32,
    pub dynamic_cache_size: usize,
    pub collection: String,
    pub force_recreate: bool,
    pub embed_timeout: Duration,
}

impl Default for SemanticCacheConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_CACHE_TOP_K,
            threshold: DEFAULT_CACHE_THRESHOLD,
            dynamic_cache_size: DEFAULT_DYNAMIC_CACHE_SIZE,
            collection: DEFAULT_CACHE_COLLECTION.to_string(),
            force_recreate: false,
            embed_timeout: Duration::from_millis(DEFAULT_EMBED_TIMEOUT_MS),
        }
    }
}

impl SemanticCacheConfig {
    /// Cache settings from the service config; the threshold is the shared
    /// `similarity_threshold`.
    pub fn from_config(config: &Config) -> Self {
        Self {
            top_k: config.cache_top_k,
            threshold: config.similarity_threshold,
            dynamic_cache_size: config.dynamic_cache_size,
            collection: config.cache_collection.clone(),
            force_recreate: config.force_recreate_index,
            embed_timeout: config.embed_timeout,
        }
    }

    pub fn top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn dynamic_cache_size(mut self, size: usize) -> Self {
        self.dynamic_cache_size = size;
        self
    }

    pub fn collection(mut self, name: &str) -> Self {
        self.collection = name.to_string();
        self
    }

    pub fn force_recreate(mut self, force: bool) -> Self {
        self.force_recreate = force;
        self
    }

    pub fn embed_timeout(mut self, timeout: Duration) -> Self {
        self.embed_timeout = timeout;
        self
    }

    pub fn validate(&self) -> CacheResult<()> {
        if self.top_k == 0 {
            return Err(CacheError::Config {
                reason: "top_k must be > 0".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(CacheError::Config {
                reason: format!("threshold must be in [0, 1], got {}", self.threshold),
            });
        }
        if self.dynamic_cache_size == 0 {
            return Err(CacheError::Config {
                reason: "dynamic_cache_size must be > 0".to_string(),
            });
        }
        if self.collection.trim().is_empty() {
            return Err(CacheError::Config {
                reason: "collection must not be empty".to_string(),
            });
        }
        if self.embed_timeout.is_zero() {
            return Err(CacheError::Config {
                reason: "embed_timeout must be > 0".to_string(),
            });
        }
        Ok(())
    }
}
