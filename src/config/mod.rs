//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `CAGRAG_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{
    DEFAULT_CACHE_COLLECTION, DEFAULT_CACHE_TOP_K, DEFAULT_CHAIN_THRESHOLD,
    DEFAULT_DYNAMIC_CACHE_SIZE, DEFAULT_EMBED_TIMEOUT_MS, DEFAULT_GENERATION_TIMEOUT_MS,
    DEFAULT_RETRIEVAL_TIMEOUT_MS, DEFAULT_RETRIEVAL_TOP_K,
};

/// Service configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `CAGRAG_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Qdrant endpoint for the cache index. Default: `http://localhost:6334`.
    pub qdrant_url: String,

    /// Cache collection name. Default: `cache_index`.
    pub cache_collection: String,

    /// Drop and recreate the cache collection at startup. Default: `false`.
    pub force_recreate_index: bool,

    /// Capacity of the dynamic-entry eviction window. Default: `5`.
    pub dynamic_cache_size: usize,

    /// Similarity at or above which a cache lookup is a HIT. Default: `0.85`.
    pub similarity_threshold: f32,

    /// k for cache nearest-neighbor lookups. Default: `3`.
    pub cache_top_k: usize,

    /// Ollama-compatible embedding endpoint. `None` runs the stub embedder.
    pub embedding_url: Option<String>,

    /// Embedding model name. Default: `bge-m3`.
    pub embedding_model: String,

    /// Elasticsearch endpoint for the retrieval fallback. Default: `http://localhost:9200`.
    pub elasticsearch_url: String,

    /// Elasticsearch index holding the document corpus. Default: `customs-docs-v1`.
    pub elasticsearch_index: String,

    /// Passages requested from the retrieval fallback. Default: `3`.
    pub retrieval_top_k: usize,

    /// Generation model name. Default: `llama3.2:3b`.
    pub generator_model: String,

    pub embed_timeout: Duration,
    pub retrieval_timeout: Duration,
    pub generation_timeout: Duration,

    /// Document ingested into the cache at startup.
    pub precache_path: Option<PathBuf>,

    /// Question-ending catalogue (one regex fragment per line).
    pub question_pattern_file: Option<PathBuf>,
}

/// Default Qdrant URL used when `CAGRAG_QDRANT_URL` is not set.
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";

/// Default Elasticsearch URL used when `CAGRAG_ELASTICSEARCH_URL` is not set.
pub const DEFAULT_ELASTICSEARCH_URL: &str = "http://localhost:9200";

impl Default for Config {
    fn default() -> Self {
        Self {
            qdrant_url: DEFAULT_QDRANT_URL.to_string(),
            cache_collection: DEFAULT_CACHE_COLLECTION.to_string(),
            force_recreate_index: false,
            dynamic_cache_size: DEFAULT_DYNAMIC_CACHE_SIZE,
            similarity_threshold: DEFAULT_CHAIN_THRESHOLD,
            cache_top_k: DEFAULT_CACHE_TOP_K,
            embedding_url: None,
            embedding_model: "bge-m3".to_string(),
            elasticsearch_url: DEFAULT_ELASTICSEARCH_URL.to_string(),
            elasticsearch_index: "customs-docs-v1".to_string(),
            retrieval_top_k: DEFAULT_RETRIEVAL_TOP_K,
            generator_model: "llama3.2:3b".to_string(),
            embed_timeout: Duration::from_millis(DEFAULT_EMBED_TIMEOUT_MS),
            retrieval_timeout: Duration::from_millis(DEFAULT_RETRIEVAL_TIMEOUT_MS),
            generation_timeout: Duration::from_millis(DEFAULT_GENERATION_TIMEOUT_MS),
            precache_path: None,
            question_pattern_file: None,
        }
    }
}

impl Config {
    const ENV_QDRANT_URL: &'static str = "CAGRAG_QDRANT_URL";
    const ENV_CACHE_COLLECTION: &'static str = "CAGRAG_CACHE_COLLECTION";
    const ENV_FORCE_RECREATE_INDEX: &'static str = "CAGRAG_FORCE_RECREATE_INDEX";
    const ENV_DYNAMIC_CACHE_SIZE: &'static str = "CAGRAG_DYNAMIC_CACHE_SIZE";
    const ENV_SIMILARITY_THRESHOLD: &'static str = "CAGRAG_SIMILARITY_THRESHOLD";
    const ENV_CACHE_TOP_K: &'static str = "CAGRAG_CACHE_TOP_K";
    const ENV_EMBEDDING_URL: &'static str = "CAGRAG_EMBEDDING_URL";
    const ENV_EMBEDDING_MODEL: &'static str = "CAGRAG_EMBEDDING_MODEL";
    const ENV_ELASTICSEARCH_URL: &'static str = "CAGRAG_ELASTICSEARCH_URL";
    const ENV_ELASTICSEARCH_INDEX: &'static str = "CAGRAG_ELASTICSEARCH_INDEX";
    const ENV_RETRIEVAL_TOP_K: &'static str = "CAGRAG_RETRIEVAL_TOP_K";
    const ENV_GENERATOR_MODEL: &'static str = "CAGRAG_GENERATOR_MODEL";
    const ENV_EMBED_TIMEOUT_MS: &'static str = "CAGRAG_EMBED_TIMEOUT_MS";
    const ENV_RETRIEVAL_TIMEOUT_MS: &'static str = "CAGRAG_RETRIEVAL_TIMEOUT_MS";
    const ENV_GENERATION_TIMEOUT_MS: &'static str = "CAGRAG_GENERATION_TIMEOUT_MS";
    const ENV_PRECACHE_PATH: &'static str = "CAGRAG_PRECACHE_PATH";
    const ENV_QUESTION_PATTERN_FILE: &'static str = "CAGRAG_QUESTION_PATTERN_FILE";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            qdrant_url: Self::parse_string_from_env(Self::ENV_QDRANT_URL, defaults.qdrant_url),
            cache_collection: Self::parse_string_from_env(
                Self::ENV_CACHE_COLLECTION,
                defaults.cache_collection,
            ),
            force_recreate_index: Self::parse_bool_from_env(
                Self::ENV_FORCE_RECREATE_INDEX,
                defaults.force_recreate_index,
            )?,
            dynamic_cache_size: Self::parse_from_env(
                Self::ENV_DYNAMIC_CACHE_SIZE,
                defaults.dynamic_cache_size,
            )?,
            similarity_threshold: Self::parse_from_env(
                Self::ENV_SIMILARITY_THRESHOLD,
                defaults.similarity_threshold,
            )?,
            cache_top_k: Self::parse_from_env(Self::ENV_CACHE_TOP_K, defaults.cache_top_k)?,
            embedding_url: Self::parse_optional_string_from_env(Self::ENV_EMBEDDING_URL),
            embedding_model: Self::parse_string_from_env(
                Self::ENV_EMBEDDING_MODEL,
                defaults.embedding_model,
            ),
            elasticsearch_url: Self::parse_string_from_env(
                Self::ENV_ELASTICSEARCH_URL,
                defaults.elasticsearch_url,
            ),
            elasticsearch_index: Self::parse_string_from_env(
                Self::ENV_ELASTICSEARCH_INDEX,
                defaults.elasticsearch_index,
            ),
            retrieval_top_k: Self::parse_from_env(
                Self::ENV_RETRIEVAL_TOP_K,
                defaults.retrieval_top_k,
            )?,
            generator_model: Self::parse_string_from_env(
                Self::ENV_GENERATOR_MODEL,
                defaults.generator_model,
            ),
            embed_timeout: Self::parse_millis_from_env(
                Self::ENV_EMBED_TIMEOUT_MS,
                defaults.embed_timeout,
            )?,
            retrieval_timeout: Self::parse_millis_from_env(
                Self::ENV_RETRIEVAL_TIMEOUT_MS,
                defaults.retrieval_timeout,
            )?,
            generation_timeout: Self::parse_millis_from_env(
                Self::ENV_GENERATION_TIMEOUT_MS,
                defaults.generation_timeout,
            )?,
            precache_path: Self::parse_optional_path_from_env(Self::ENV_PRECACHE_PATH),
            question_pattern_file: Self::parse_optional_path_from_env(
                Self::ENV_QUESTION_PATTERN_FILE,
            ),
        })
    }

    /// Validates ranges and paths (does not touch the network).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(ConfigError::OutOfRange {
                name: Self::ENV_SIMILARITY_THRESHOLD,
                reason: format!("{} is not within [0, 1]", self.similarity_threshold),
            });
        }

        for (name, value) in [
            (Self::ENV_DYNAMIC_CACHE_SIZE, self.dynamic_cache_size),
            (Self::ENV_CACHE_TOP_K, self.cache_top_k),
            (Self::ENV_RETRIEVAL_TOP_K, self.retrieval_top_k),
        ] {
            if value == 0 {
                return Err(ConfigError::OutOfRange {
                    name,
                    reason: "must be > 0".to_string(),
                });
            }
        }

        for (name, value) in [
            (Self::ENV_EMBED_TIMEOUT_MS, self.embed_timeout),
            (Self::ENV_RETRIEVAL_TIMEOUT_MS, self.retrieval_timeout),
            (Self::ENV_GENERATION_TIMEOUT_MS, self.generation_timeout),
        ] {
            if value.is_zero() {
                return Err(ConfigError::OutOfRange {
                    name,
                    reason: "timeout must be > 0 ms".to_string(),
                });
            }
        }

        for path in [&self.precache_path, &self.question_pattern_file]
            .into_iter()
            .flatten()
        {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_file() {
                return Err(ConfigError::NotAFile { path: path.clone() });
            }
        }

        Ok(())
    }

    fn parse_from_env<T>(var_name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match env::var(var_name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidValue {
                    name: var_name,
                    value: value.clone(),
                    reason: e.to_string(),
                }),
            Err(_) => Ok(default),
        }
    }

    fn parse_bool_from_env(var_name: &'static str, default: bool) -> Result<bool, ConfigError> {
        match env::var(var_name) {
            Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" | "" => Ok(false),
                _ => Err(ConfigError::InvalidValue {
                    name: var_name,
                    value,
                    reason: "expected a boolean".to_string(),
                }),
            },
            Err(_) => Ok(default),
        }
    }

    fn parse_millis_from_env(
        var_name: &'static str,
        default: Duration,
    ) -> Result<Duration, ConfigError> {
        let millis = Self::parse_from_env(var_name, default.as_millis() as u64)?;
        Ok(Duration::from_millis(millis))
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        Self::parse_optional_string_from_env(var_name).map(PathBuf::from)
    }

    fn parse_optional_string_from_env(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name).unwrap_or(default)
    }
}
