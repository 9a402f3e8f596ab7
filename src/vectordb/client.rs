use std::future::Future;
use std::sync::Arc;

use qdrant_client::Qdrant;
use qdrant_client::qdrant::vectors_config::Config as VectorsConfigKind;
use qdrant_client::qdrant::{
    Condition, CountPointsBuilder, CreateCollectionBuilder, DeletePointsBuilder, Distance, Filter,
    PointStruct, PointsIdsList, ScrollPointsBuilder, SearchPointsBuilder, UpsertPointsBuilder,
    VectorParamsBuilder,
};
use tracing::debug;

use super::error::VectorDbError;
use super::model::{CachePayload, SearchResult, VectorPoint};

/// Points fetched per scroll request.
const SCROLL_PAGE_SIZE: u32 = 256;

#[derive(Clone)]
/// Direct Qdrant client wrapper.
pub struct QdrantClient {
    client: Qdrant,
    url: String,
}

impl std::fmt::Debug for QdrantClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QdrantClient")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl QdrantClient {
    /// Creates a client for `url`. No request is made until first use.
    pub fn new(url: &str) -> Result<Self, VectorDbError> {
        let client =
            Qdrant::from_url(url)
                .build()
                .map_err(|e| VectorDbError::ConnectionFailed {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    /// Returns the configured URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    fn connection_error(&self, e: impl std::fmt::Display) -> VectorDbError {
        VectorDbError::ConnectionFailed {
            url: self.url.clone(),
            message: e.to_string(),
        }
    }

    /// Performs a basic health check request.
    pub async fn health_check(&self) -> Result<(), VectorDbError> {
        self.client
            .health_check()
            .await
            .map_err(|e| self.connection_error(e))?;
        Ok(())
    }

    /// Returns the vector size of `name`, or `None` if the collection does not exist.
    pub async fn collection_dimension(&self, name: &str) -> Result<Option<u64>, VectorDbError> {
        let exists = self
            .client
            .collection_exists(name)
            .await
            .map_err(|e| self.connection_error(e))?;
        if !exists {
            return Ok(None);
        }

        let info = self
            .client
            .collection_info(name)
            .await
            .map_err(|e| self.connection_error(e))?;

        let size = info
            .result
            .and_then(|r| r.config)
            .and_then(|c| c.params)
            .and_then(|p| p.vectors_config)
            .and_then(|v| v.config)
            .and_then(|c| match c {
                VectorsConfigKind::Params(params) => Some(params.size),
                VectorsConfigKind::ParamsMap(_) => None,
            });

        size.map(Some)
            .ok_or_else(|| VectorDbError::CreateCollectionFailed {
                collection: name.to_string(),
                message: "collection has no single unnamed vector".to_string(),
            })
    }

    /// Creates a collection with cosine distance.
    pub async fn create_collection(
        &self,
        name: &str,
        vector_size: u64,
    ) -> Result<(), VectorDbError> {
        let vectors_config = VectorParamsBuilder::new(vector_size, Distance::Cosine);

        self.client
            .create_collection(
                CreateCollectionBuilder::new(name)
                    .vectors_config(vectors_config)
                    .on_disk_payload(true),
            )
            .await
            .map_err(|e| VectorDbError::CreateCollectionFailed {
                collection: name.to_string(),
                message: e.to_string(),
            })?;

        debug!(collection = name, vector_size, "Collection created");
        Ok(())
    }

    /// Drops a collection. Dropping a missing collection is not an error.
    pub async fn drop_collection(&self, name: &str) -> Result<(), VectorDbError> {
        let exists = self
            .client
            .collection_exists(name)
            .await
            .map_err(|e| self.connection_error(e))?;
        if !exists {
            return Ok(());
        }

        self.client
            .delete_collection(name)
            .await
            .map_err(|e| VectorDbError::DropCollectionFailed {
                collection: name.to_string(),
                message: e.to_string(),
            })?;

        debug!(collection = name, "Collection dropped");
        Ok(())
    }

    /// Upserts points into a collection.
    pub async fn upsert_points(
        &self,
        collection: &str,
        points: Vec<VectorPoint>,
    ) -> Result<(), VectorDbError> {
        if points.is_empty() {
            return Ok(());
        }

        let qdrant_points: Vec<PointStruct> = points
            .into_iter()
            .map(|p| PointStruct::new(p.id, p.vector, p.payload.into_qdrant()))
            .collect();

        self.client
            .upsert_points(
                UpsertPointsBuilder::new(collection, qdrant_points).wait(true),
            )
            .await
            .map_err(|e| VectorDbError::UpsertFailed {
                collection: collection.to_string(),
                message: e.to_string(),
            })?;

        Ok(())
    }

    /// Searches a collection by cosine similarity, best first.
    pub async fn search(
        &self,
        collection: &str,
        query: Vec<f32>,
        limit: u64,
    ) -> Result<Vec<SearchResult>, VectorDbError> {
        let search_result = self
            .client
            .search_points(SearchPointsBuilder::new(collection, query, limit).with_payload(true))
            .await
            .map_err(|e| VectorDbError::SearchFailed {
                collection: collection.to_string(),
                message: e.to_string(),
            })?;

        let results = search_result
            .result
            .into_iter()
            .filter_map(SearchResult::from_scored_point)
            .collect();

        Ok(results)
    }

    /// Deletes points by id. Unknown ids are ignored by Qdrant.
    pub async fn delete_points(
        &self,
        collection: &str,
        ids: Vec<u64>,
    ) -> Result<(), VectorDbError> {
        if ids.is_empty() {
            return Ok(());
        }

        let points_selector = PointsIdsList {
            ids: ids.into_iter().map(|id| id.into()).collect(),
        };

        self.client
            .delete_points(
                DeletePointsBuilder::new(collection)
                    .points(points_selector)
                    .wait(true),
            )
            .await
            .map_err(|e| VectorDbError::DeleteFailed {
                collection: collection.to_string(),
                message: e.to_string(),
            })?;

        Ok(())
    }

    /// Payloads of every point whose `origin` equals `origin`, in no particular order.
    pub async fn scroll_payloads(
        &self,
        collection: &str,
        origin: &str,
    ) -> Result<Vec<CachePayload>, VectorDbError> {
        let mut payloads = Vec::new();
        let mut offset = None;

        loop {
            let mut request = ScrollPointsBuilder::new(collection)
                .filter(Filter::must([Condition::matches(
                    "origin",
                    origin.to_string(),
                )]))
                .with_payload(true)
                .with_vectors(false)
                .limit(SCROLL_PAGE_SIZE);
            if let Some(offset) = offset.take() {
                request = request.offset(offset);
            }

            let response = self.client.scroll(request).await.map_err(|e| {
                VectorDbError::ScrollFailed {
                    collection: collection.to_string(),
                    message: e.to_string(),
                }
            })?;

            payloads.extend(
                response
                    .result
                    .iter()
                    .filter_map(|point| CachePayload::from_qdrant(&point.payload)),
            );

            match response.next_page_offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        debug!(collection, origin, count = payloads.len(), "Scrolled payloads");
        Ok(payloads)
    }

    /// Exact number of points in a collection.
    pub async fn count_points(&self, collection: &str) -> Result<u64, VectorDbError> {
        let response = self
            .client
            .count(CountPointsBuilder::new(collection).exact(true))
            .await
            .map_err(|e| VectorDbError::CountFailed {
                collection: collection.to_string(),
                message: e.to_string(),
            })?;

        Ok(response.result.map(|r| r.count).unwrap_or(0))
    }
}

/// Minimal async interface used by the cache index.
pub trait VectorDbClient: Send + Sync {
    /// Succeeds when the backend answers requests.
    fn is_ready(&self) -> impl Future<Output = Result<(), VectorDbError>> + Send;

    /// Vector size of an existing collection, `None` when absent.
    fn collection_dimension(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<u64>, VectorDbError>> + Send;

    /// Creates a cosine collection.
    fn create_collection(
        &self,
        name: &str,
        vector_size: u64,
    ) -> impl Future<Output = Result<(), VectorDbError>> + Send;

    /// Drops a collection if it exists.
    fn drop_collection(&self, name: &str) -> impl Future<Output = Result<(), VectorDbError>> + Send;

    /// Upserts points; returns once they are searchable.
    fn upsert_points(
        &self,
        collection: &str,
        points: Vec<VectorPoint>,
    ) -> impl Future<Output = Result<(), VectorDbError>> + Send;

    /// Searches for similar points, best first.
    fn search(
        &self,
        collection: &str,
        query: Vec<f32>,
        limit: u64,
    ) -> impl Future<Output = Result<Vec<SearchResult>, VectorDbError>> + Send;

    /// Deletes points.
    fn delete_points(
        &self,
        collection: &str,
        ids: Vec<u64>,
    ) -> impl Future<Output = Result<(), VectorDbError>> + Send;

    /// Counts points.
    fn count_points(&self, collection: &str)
    -> impl Future<Output = Result<u64, VectorDbError>> + Send;

    /// Payloads of every point with the given origin tag.
    fn scroll_payloads(
        &self,
        collection: &str,
        origin: &str,
    ) -> impl Future<Output = Result<Vec<CachePayload>, VectorDbError>> + Send;
}

impl VectorDbClient for QdrantClient {
    async fn is_ready(&self) -> Result<(), VectorDbError> {
        self.health_check().await
    }

    async fn collection_dimension(&self, name: &str) -> Result<Option<u64>, VectorDbError> {
        self.collection_dimension(name).await
    }

    async fn create_collection(&self, name: &str, vector_size: u64) -> Result<(), VectorDbError> {
        self.create_collection(name, vector_size).await
    }

    async fn drop_collection(&self, name: &str) -> Result<(), VectorDbError> {
        self.drop_collection(name).await
    }

    async fn upsert_points(
        &self,
        collection: &str,
        points: Vec<VectorPoint>,
    ) -> Result<(), VectorDbError> {
        self.upsert_points(collection, points).await
    }

    async fn search(
        &self,
        collection: &str,
        query: Vec<f32>,
        limit: u64,
    ) -> Result<Vec<SearchResult>, VectorDbError> {
        self.search(collection, query, limit).await
    }

    async fn delete_points(&self, collection: &str, ids: Vec<u64>) -> Result<(), VectorDbError> {
        self.delete_points(collection, ids).await
    }

    async fn count_points(&self, collection: &str) -> Result<u64, VectorDbError> {
        self.count_points(collection).await
    }

    async fn scroll_payloads(
        &self,
        collection: &str,
        origin: &str,
    ) -> Result<Vec<CachePayload>, VectorDbError> {
        self.scroll_payloads(collection, origin).await
    }
}

/// Lets several owners share one backend.
impl<T: VectorDbClient> VectorDbClient for Arc<T> {
    async fn is_ready(&self) -> Result<(), VectorDbError> {
        self.as_ref().is_ready().await
    }

    async fn collection_dimension(&self, name: &str) -> Result<Option<u64>, VectorDbError> {
        self.as_ref().collection_dimension(name).await
    }

    async fn create_collection(&self, name: &str, vector_size: u64) -> Result<(), VectorDbError> {
        self.as_ref().create_collection(name, vector_size).await
    }

    async fn drop_collection(&self, name: &str) -> Result<(), VectorDbError> {
        self.as_ref().drop_collection(name).await
    }

    async fn upsert_points(
        &self,
        collection: &str,
        points: Vec<VectorPoint>,
    ) -> Result<(), VectorDbError> {
        self.as_ref().upsert_points(collection, points).await
    }

    async fn search(
        &self,
        collection: &str,
        query: Vec<f32>,
        limit: u64,
    ) -> Result<Vec<SearchResult>, VectorDbError> {
        self.as_ref().search(collection, query, limit).await
    }

    async fn delete_points(&self, collection: &str, ids: Vec<u64>) -> Result<(), VectorDbError> {
        self.as_ref().delete_points(collection, ids).await
    }

    async fn count_points(&self, collection: &str) -> Result<u64, VectorDbError> {
        self.as_ref().count_points(collection).await
    }

    async fn scroll_payloads(
        &self,
        collection: &str,
        origin: &str,
    ) -> Result<Vec<CachePayload>, VectorDbError> {
        self.as_ref().scroll_payloads(collection, origin).await
    }
}
