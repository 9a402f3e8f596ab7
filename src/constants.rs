//! Cross-cutting, shared constants.
//!
//! Defaults live here so the config layer, the cache and the chain agree on them.
//!
//! # Thresholds
//!
//! Two HIT thresholds exist: [`DEFAULT_CACHE_THRESHOLD`] for callers of the bare
//! [`SemanticCache`](crate::cache::SemanticCache) API and [`DEFAULT_CHAIN_THRESHOLD`] for the
//! [`CacheChain`](crate::chain::CacheChain). When both are built from
//! [`Config`](crate::config::Config) they share the single `similarity_threshold` knob.

/// Default k for cache nearest-neighbor lookups.
pub const DEFAULT_CACHE_TOP_K: usize = 3;

/// Default number of passages requested from the retrieval fallback.
pub const DEFAULT_RETRIEVAL_TOP_K: usize = 3;

/// Default HIT threshold for the bare cache API.
pub const DEFAULT_CACHE_THRESHOLD: f32 = 0.70;

/// Default HIT threshold for the orchestration chain.
pub const DEFAULT_CHAIN_THRESHOLD: f32 = 0.85;

/// Default capacity of the dynamic-entry eviction window.
pub const DEFAULT_DYNAMIC_CACHE_SIZE: usize = 5;

/// Default cache collection name.
pub const DEFAULT_CACHE_COLLECTION: &str = "cache_index";

pub const DEFAULT_EMBED_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_RETRIEVAL_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_GENERATION_TIMEOUT_MS: u64 = 120_000;

/// Text embedded once at startup to learn the embedding dimension.
pub const DIMENSION_SAMPLE_TEXT: &str = "차원 확인";

/// Key prefix shared by every cache entry.
pub const CACHE_KEY_PREFIX: &str = "cache:";

/// Origin tag stored with pre-cached (ingested) entries.
pub const ORIGIN_TAG_PRE_CACHED: &str = "pdf_pre_cache";

/// Origin tag stored with dynamic (write-back) entries.
pub const ORIGIN_TAG_DYNAMIC: &str = "dynamic_cache";

/// Marker inserted between a page's body text and its flattened tables.
pub const TABLE_SECTION_MARKER: &str = "[표 데이터]";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_threshold_is_stricter_than_cache_threshold() {
        assert!(DEFAULT_CHAIN_THRESHOLD > DEFAULT_CACHE_THRESHOLD);
    }
}
