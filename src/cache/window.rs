use std::collections::VecDeque;

use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::vectordb::VectorDbClient;

use super::error::CacheResult;
use super::index::SemanticCacheIndex;
use super::types::CacheEntry;

/// Recency-bounded list of dynamic cache keys.
///
/// Holds at most `capacity` keys, oldest first. Pushing past capacity evicts the oldest
/// key and deletes its entry from the index before the lock is released, so no caller
/// ever observes more than `capacity` keys.
#[derive(Debug)]
pub struct EvictionWindow {
    capacity: usize,
    keys: Mutex<VecDeque<String>>,
}

impl EvictionWindow {
    /// Creates an empty window. A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            keys: Mutex::new(VecDeque::with_capacity(capacity + 1)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Records `key` as most recent and evicts past capacity.
    ///
    /// Returns the evicted key, if any.
    pub async fn insert<B: VectorDbClient>(
        &self,
        key: String,
        index: &SemanticCacheIndex<B>,
    ) -> Option<String> {
        let mut keys = self.keys.lock().await;
        self.push_and_evict(&mut keys, key, index).await
    }

    /// Writes `entry` to the index and records its key inside one critical section.
    ///
    /// Nothing is recorded when the index write fails.
    #[instrument(skip(self, entry, index), fields(key = %entry.key))]
    pub async fn write_through<B: VectorDbClient>(
        &self,
        entry: CacheEntry,
        index: &SemanticCacheIndex<B>,
    ) -> CacheResult<Option<String>> {
        let mut keys = self.keys.lock().await;
        let key = entry.key.clone();
        index.insert(entry).await?;
        Ok(self.push_and_evict(&mut keys, key, index).await)
    }

    async fn push_and_evict<B: VectorDbClient>(
        &self,
        keys: &mut VecDeque<String>,
        key: String,
        index: &SemanticCacheIndex<B>,
    ) -> Option<String> {
        if let Some(pos) = keys.iter().position(|k| *k == key) {
            keys.remove(pos);
        }
        keys.push_back(key);

        if keys.len() <= self.capacity {
            return None;
        }

        let oldest = keys.pop_front()?;
        match index.delete(&oldest).await {
            Ok(()) => debug!(key = %oldest, "Evicted oldest dynamic entry"),
            Err(e) => warn!(key = %oldest, error = %e, "Failed to delete evicted entry"),
        }
        Some(oldest)
    }

    /// Replays `keys` (oldest first) into the window, evicting past capacity.
    ///
    /// Used when opening over an index that already holds dynamic entries. Returns the
    /// evicted keys.
    #[instrument(skip_all, fields(keys = keys.len()))]
    pub async fn restore<B: VectorDbClient>(
        &self,
        keys: Vec<String>,
        index: &SemanticCacheIndex<B>,
    ) -> Vec<String> {
        let mut window = self.keys.lock().await;
        let mut evicted = Vec::new();
        for key in keys {
            if let Some(oldest) = self.push_and_evict(&mut window, key, index).await {
                evicted.push(oldest);
            }
        }
        evicted
    }

    /// Keys oldest first.
    pub async fn keys(&self) -> Vec<String> {
        self.keys.lock().await.iter().cloned().collect()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.keys.lock().await.iter().any(|k| k == key)
    }

    pub async fn len(&self) -> usize {
        self.keys.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
