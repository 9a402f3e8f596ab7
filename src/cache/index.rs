use tracing::{debug, error, info, instrument};

use crate::hashing::point_id_for_key;
use crate::vectordb::{CachePayload, VectorDbClient, VectorPoint};

use super::error::{CacheError, CacheResult};
use super::types::{CacheEntry, CacheMatch, CacheOrigin};

/// Keyed vector index over a single backend collection.
///
/// The dimension is fixed when the index is opened. Writes wait for the backend to make
/// them searchable, so a lookup issued after `insert` returns observes the entry.
pub struct SemanticCacheIndex<B: VectorDbClient> {
    backend: B,
    collection: String,
    dimension: usize,
}

impl<B: VectorDbClient> std::fmt::Debug for SemanticCacheIndex<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticCacheIndex")
            .field("collection", &self.collection)
            .field("dimension", &self.dimension)
            .finish_non_exhaustive()
    }
}

impl<B: VectorDbClient> SemanticCacheIndex<B> {
    /// Opens `collection`, creating it when absent.
    ///
    /// With `force_recreate` the collection is dropped first. An existing collection of a
    /// different dimension is rejected with [`CacheError::DimensionMismatch`].
    #[instrument(skip(backend))]
    pub async fn open(
        backend: B,
        collection: &str,
        dimension: usize,
        force_recreate: bool,
    ) -> CacheResult<Self> {
        if dimension == 0 {
            return Err(CacheError::Config {
                reason: "index dimension must be > 0".to_string(),
            });
        }

        if force_recreate {
            backend.drop_collection(collection).await?;
            info!(collection, "Dropped cache collection for full reindex");
        }

        match backend.collection_dimension(collection).await? {
            None => {
                backend
                    .create_collection(collection, dimension as u64)
                    .await?;
                info!(collection, dimension, "Cache collection created");
            }
            Some(existing) if existing as usize == dimension => {
                info!(collection, dimension, "Reusing existing cache collection");
            }
            Some(existing) => {
                error!(
                    collection,
                    expected = dimension,
                    actual = existing,
                    "Existing cache collection has a different dimension"
                );
                return Err(CacheError::DimensionMismatch {
                    expected: dimension,
                    actual: existing as usize,
                });
            }
        }

        Ok(Self {
            backend,
            collection: collection.to_string(),
            dimension,
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn check_dimension(&self, actual: usize) -> CacheResult<()> {
        if actual != self.dimension {
            error!(
                collection = %self.collection,
                expected = self.dimension,
                actual,
                "Vector dimension does not match the cache index"
            );
            return Err(CacheError::DimensionMismatch {
                expected: self.dimension,
                actual,
            });
        }
        Ok(())
    }

    fn to_point(&self, entry: CacheEntry) -> VectorPoint {
        VectorPoint::new(
            point_id_for_key(&entry.key),
            entry.embedding,
            CachePayload {
                key: entry.key,
                text: entry.text,
                origin: entry.origin.tag().to_string(),
                question: entry.question,
                created_at: chrono::Utc::now().timestamp_millis(),
            },
        )
    }

    /// Writes `entry`, overwriting any entry under the same key.
    #[instrument(skip(self, entry), fields(key = %entry.key, origin = %entry.origin))]
    pub async fn insert(&self, entry: CacheEntry) -> CacheResult<()> {
        self.check_dimension(entry.embedding.len())?;
        let point = self.to_point(entry);
        self.backend
            .upsert_points(&self.collection, vec![point])
            .await?;
        debug!("Cache entry written");
        Ok(())
    }

    /// Writes all entries in one request. Nothing is written if any vector has the wrong
    /// dimension.
    pub async fn insert_batch(&self, entries: Vec<CacheEntry>) -> CacheResult<usize> {
        for entry in &entries {
            self.check_dimension(entry.embedding.len())?;
        }

        let count = entries.len();
        let points: Vec<VectorPoint> = entries.into_iter().map(|e| self.to_point(e)).collect();
        self.backend
            .upsert_points(&self.collection, points)
            .await?;
        debug!(count, collection = %self.collection, "Cache entries written");
        Ok(count)
    }

    /// Up to `k` entries closest to `vector`, ascending by cosine distance.
    pub async fn nearest_neighbors(&self, vector: &[f32], k: usize) -> CacheResult<Vec<CacheMatch>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        self.check_dimension(vector.len())?;

        let results = self
            .backend
            .search(&self.collection, vector.to_vec(), k as u64)
            .await?;

        let mut matches: Vec<CacheMatch> = results
            .into_iter()
            .map(|r| CacheMatch {
                origin: CacheOrigin::from_tag(&r.payload.origin),
                key: r.payload.key,
                text: r.payload.text,
                distance: 1.0 - r.score,
            })
            .collect();

        matches.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(k);
        Ok(matches)
    }

    /// Removes the entry under `key`. Absent keys are not an error.
    pub async fn delete(&self, key: &str) -> CacheResult<()> {
        self.backend
            .delete_points(&self.collection, vec![point_id_for_key(key)])
            .await?;
        debug!(key, "Cache entry deleted");
        Ok(())
    }

    /// Keys of the dynamic entries already in the index, oldest first.
    ///
    /// Ordered by write time, ties broken by key.
    pub async fn dynamic_keys(&self) -> CacheResult<Vec<String>> {
        let mut payloads = self
            .backend
            .scroll_payloads(&self.collection, CacheOrigin::Dynamic.tag())
            .await?;
        payloads.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.key.cmp(&b.key)));
        Ok(payloads.into_iter().map(|p| p.key).collect())
    }

    /// Number of entries in the index.
    pub async fn len(&self) -> CacheResult<u64> {
        Ok(self.backend.count_points(&self.collection).await?)
    }

    pub async fn is_empty(&self) -> CacheResult<bool> {
        Ok(self.len().await? == 0)
    }

    pub async fn is_ready(&self) -> bool {
        self.backend.is_ready().await.is_ok()
    }
}
