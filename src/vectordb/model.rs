use std::collections::HashMap;

use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::{ScoredPoint, Value};

/// Payload stored alongside every cache vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePayload {
    /// Cache key the point was written under.
    pub key: String,
    /// Answer text returned on a hit.
    pub text: String,
    /// Origin tag (`pdf_pre_cache` / `dynamic_cache`).
    pub origin: String,
    /// Question the answer was produced for, when known.
    pub question: Option<String>,
    /// Unix milliseconds.
    pub created_at: i64,
}

impl CachePayload {
    pub(crate) fn into_qdrant(self) -> HashMap<String, Value> {
        let mut payload: HashMap<String, Value> = HashMap::new();
        payload.insert("key".to_string(), self.key.into());
        payload.insert("text".to_string(), self.text.into());
        payload.insert("origin".to_string(), self.origin.into());
        payload.insert("created_at".to_string(), self.created_at.into());
        if let Some(question) = self.question {
            payload.insert("question".to_string(), question.into());
        }
        payload
    }

    /// Parses a Qdrant payload; `None` when `key` or `text` is missing.
    pub(crate) fn from_qdrant(payload: &HashMap<String, Value>) -> Option<Self> {
        let string = |name: &str| payload.get(name).and_then(|v| v.as_str()).cloned();

        Some(Self {
            key: string("key")?,
            text: string("text")?,
            origin: string("origin").unwrap_or_default(),
            question: string("question"),
            created_at: payload
                .get("created_at")
                .and_then(|v| v.as_integer())
                .unwrap_or(0),
        })
    }
}

#[derive(Debug, Clone)]
pub struct VectorPoint {
    pub id: u64,
    pub vector: Vec<f32>,
    pub payload: CachePayload,
}

impl VectorPoint {
    pub fn new(id: u64, vector: Vec<f32>, payload: CachePayload) -> Self {
        Self {
            id,
            vector,
            payload,
        }
    }
}

/// A scored search hit. `score` is cosine similarity.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub id: u64,
    pub score: f32,
    pub payload: CachePayload,
}

impl SearchResult {
    /// Converts a Qdrant hit; points with non-numeric ids or foreign payloads are skipped.
    pub fn from_scored_point(point: ScoredPoint) -> Option<Self> {
        let id = match point.id.and_then(|pid| pid.point_id_options) {
            Some(PointIdOptions::Num(n)) => n,
            _ => return None,
        };

        let payload = CachePayload::from_qdrant(&point.payload)?;

        Some(SearchResult {
            id,
            score: point.score,
            payload,
        })
    }
}
