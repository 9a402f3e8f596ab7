//! BLAKE3-derived cache keys and point ids.

use blake3::Hasher;

use crate::constants::CACHE_KEY_PREFIX;

/// Computes a 64-bit hash of the input data using BLAKE3, truncated from 256 bits.
///
/// # Collision Tolerance
///
/// Dynamic cache keys and backend point ids are both derived from this value. A collision
/// between two distinct questions means the later write-back overwrites the earlier entry
/// (last write wins); nothing else depends on uniqueness. With 64 bits the birthday bound
/// sits around 4.3 billion distinct questions, far beyond any dynamic window size.
#[inline]
pub fn hash_to_u64(data: &[u8]) -> u64 {
    let hash = blake3::hash(data);
    let bytes: [u8; 8] = hash.as_bytes()[0..8]
        .try_into()
        .expect("BLAKE3 always produces at least 8 bytes");
    u64::from_le_bytes(bytes)
}

/// Key under which a write-back answer for `query` is stored.
///
/// Deterministic: the same query text always maps to the same key.
#[inline]
pub fn dynamic_cache_key(query: &str) -> String {
    format!("{}dyn:{:016x}", CACHE_KEY_PREFIX, hash_to_u64(query.as_bytes()))
}

/// Key under which the `index`-th ingested pair of `source` is stored.
///
/// The source tag keeps pairs from different documents from overwriting each other.
#[inline]
pub fn pre_cache_key(source: &str, index: usize) -> String {
    format!("{}pre:{:08x}:{}", CACHE_KEY_PREFIX, source_tag(source), index)
}

/// Backend point id for a cache key.
#[inline]
pub fn point_id_for_key(key: &str) -> u64 {
    hash_to_u64(key.as_bytes())
}

#[inline]
fn source_tag(source: &str) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(b"source|");
    hasher.update(source.as_bytes());
    let hash = hasher.finalize();
    let bytes: [u8; 4] = hash.as_bytes()[0..4]
        .try_into()
        .expect("BLAKE3 always produces at least 4 bytes");
    u32::from_le_bytes(bytes)
}
