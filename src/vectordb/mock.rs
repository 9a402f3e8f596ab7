use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::RwLock;

use crate::vectordb::{
    CachePayload, SearchResult, VectorDbClient, VectorDbError, VectorPoint,
};

const MOCK_URL: &str = "mock://vectordb";

/// In-memory backend with brute-force cosine search.
///
/// `set_available(false)` makes every call fail with `ConnectionFailed`.
#[derive(Debug)]
pub struct MockVectorDbClient {
    collections: RwLock<HashMap<String, MockCollection>>,
    available: AtomicBool,
    deletes: AtomicUsize,
}

#[derive(Debug, Default, Clone)]
struct MockCollection {
    vector_size: u64,
    points: HashMap<u64, MockStoredPoint>,
}

#[derive(Debug, Clone)]
struct MockStoredPoint {
    vector: Vec<f32>,
    payload: CachePayload,
}

impl Default for MockVectorDbClient {
    fn default() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
            deletes: AtomicUsize::new(0),
        }
    }
}

impl MockVectorDbClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn point_count(&self, collection: &str) -> Option<usize> {
        self.collections
            .read()
            .get(collection)
            .map(|c| c.points.len())
    }

    pub fn contains_point(&self, collection: &str, id: u64) -> bool {
        self.collections
            .read()
            .get(collection)
            .is_some_and(|c| c.points.contains_key(&id))
    }

    /// Stored payload keys, sorted.
    pub fn keys(&self, collection: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .collections
            .read()
            .get(collection)
            .map(|c| c.points.values().map(|p| p.payload.key.clone()).collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    /// Number of `delete_points` calls that reached the store.
    pub fn delete_calls(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), VectorDbError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(VectorDbError::ConnectionFailed {
                url: MOCK_URL.to_string(),
                message: "mock backend unavailable".to_string(),
            })
        }
    }
}

impl VectorDbClient for MockVectorDbClient {
    async fn is_ready(&self) -> Result<(), VectorDbError> {
        self.check_available()
    }

    async fn collection_dimension(&self, name: &str) -> Result<Option<u64>, VectorDbError> {
        self.check_available()?;
        Ok(self.collections.read().get(name).map(|c| c.vector_size))
    }

    async fn create_collection(&self, name: &str, vector_size: u64) -> Result<(), VectorDbError> {
        self.check_available()?;
        let mut collections = self.collections.write();
        if collections.contains_key(name) {
            return Err(VectorDbError::CreateCollectionFailed {
                collection: name.to_string(),
                message: "collection already exists".to_string(),
            });
        }
        collections.insert(
            name.to_string(),
            MockCollection {
                vector_size,
                points: HashMap::new(),
            },
        );
        Ok(())
    }

    async fn drop_collection(&self, name: &str) -> Result<(), VectorDbError> {
        self.check_available()?;
        self.collections.write().remove(name);
        Ok(())
    }

    async fn upsert_points(
        &self,
        collection: &str,
        points: Vec<VectorPoint>,
    ) -> Result<(), VectorDbError> {
        self.check_available()?;
        let mut collections = self.collections.write();

        let coll =
            collections
                .get_mut(collection)
                .ok_or_else(|| VectorDbError::CollectionNotFound {
                    collection: collection.to_string(),
                })?;

        if let Some(bad) = points
            .iter()
            .find(|p| p.vector.len() as u64 != coll.vector_size)
        {
            return Err(VectorDbError::InvalidDimension {
                expected: coll.vector_size as usize,
                actual: bad.vector.len(),
            });
        }

        for point in points {
            coll.points.insert(
                point.id,
                MockStoredPoint {
                    vector: point.vector,
                    payload: point.payload,
                },
            );
        }

        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        query: Vec<f32>,
        limit: u64,
    ) -> Result<Vec<SearchResult>, VectorDbError> {
        self.check_available()?;
        let collections = self.collections.read();

        let coll =
            collections
                .get(collection)
                .ok_or_else(|| VectorDbError::CollectionNotFound {
                    collection: collection.to_string(),
                })?;

        let mut results: Vec<SearchResult> = coll
            .points
            .iter()
            .map(|(&id, p)| SearchResult {
                id,
                score: cosine_similarity(&query, &p.vector),
                payload: p.payload.clone(),
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        results.truncate(limit as usize);
        Ok(results)
    }

    async fn delete_points(&self, collection: &str, ids: Vec<u64>) -> Result<(), VectorDbError> {
        self.check_available()?;
        let mut collections = self.collections.write();

        let coll =
            collections
                .get_mut(collection)
                .ok_or_else(|| VectorDbError::CollectionNotFound {
                    collection: collection.to_string(),
                })?;

        self.deletes.fetch_add(1, Ordering::SeqCst);
        for id in ids {
            coll.points.remove(&id);
        }

        Ok(())
    }

    async fn count_points(&self, collection: &str) -> Result<u64, VectorDbError> {
        self.check_available()?;
        self.collections
            .read()
            .get(collection)
            .map(|c| c.points.len() as u64)
            .ok_or_else(|| VectorDbError::CollectionNotFound {
                collection: collection.to_string(),
            })
    }

    async fn scroll_payloads(
        &self,
        collection: &str,
        origin: &str,
    ) -> Result<Vec<CachePayload>, VectorDbError> {
        self.check_available()?;
        self.collections
            .read()
            .get(collection)
            .map(|c| {
                c.points
                    .values()
                    .filter(|p| p.payload.origin == origin)
                    .map(|p| p.payload.clone())
                    .collect()
            })
            .ok_or_else(|| VectorDbError::CollectionNotFound {
                collection: collection.to_string(),
            })
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}
