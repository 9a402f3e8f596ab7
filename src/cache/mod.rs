//! Semantic cache: nearest-neighbor index, dynamic eviction window and the lookup facade.

pub mod config;
pub mod error;
pub mod index;
pub mod semantic;
pub mod types;
pub mod window;

#[cfg(test)]
mod semantic_tests;

pub use config::SemanticCacheConfig;
pub use error::{CacheError, CacheResult};
pub use index::SemanticCacheIndex;
pub use semantic::SemanticCache;
pub use types::{CacheEntry, CacheHit, CacheLookup, CacheMatch, CacheOrigin, MissReason};
pub use window::EvictionWindow;
