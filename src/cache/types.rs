use crate::constants::{ORIGIN_TAG_DYNAMIC, ORIGIN_TAG_PRE_CACHED};

/// How a cache entry came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheOrigin {
    /// Ingested from a document; never evicted by the window.
    PreCached,
    /// Written back after a successful fallback answer.
    Dynamic,
}

impl CacheOrigin {
    /// Tag persisted in the index payload.
    #[inline]
    pub fn tag(&self) -> &'static str {
        match self {
            CacheOrigin::PreCached => ORIGIN_TAG_PRE_CACHED,
            CacheOrigin::Dynamic => ORIGIN_TAG_DYNAMIC,
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            ORIGIN_TAG_PRE_CACHED => Some(CacheOrigin::PreCached),
            ORIGIN_TAG_DYNAMIC => Some(CacheOrigin::Dynamic),
            _ => None,
        }
    }
}

impl std::fmt::Display for CacheOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// A record in the semantic cache index, identified by `key`.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: String,
    pub embedding: Vec<f32>,
    /// Answer returned on a hit.
    pub text: String,
    pub origin: CacheOrigin,
    pub question: Option<String>,
}

impl CacheEntry {
    pub fn new(
        key: impl Into<String>,
        embedding: Vec<f32>,
        text: impl Into<String>,
        origin: CacheOrigin,
    ) -> Self {
        Self {
            key: key.into(),
            embedding,
            text: text.into(),
            origin,
            question: None,
        }
    }

    pub fn with_question(mut self, question: impl Into<String>) -> Self {
        self.question = Some(question.into());
        self
    }
}

/// One nearest-neighbor result. `distance` is cosine distance.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheMatch {
    pub key: String,
    pub text: String,
    /// `None` when the stored tag is not recognised.
    pub origin: Option<CacheOrigin>,
    pub distance: f32,
}

impl CacheMatch {
    #[inline]
    pub fn similarity(&self) -> f32 {
        1.0 - self.distance
    }
}

/// Why a lookup missed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MissReason {
    /// The index returned no neighbors.
    Empty,
    /// The best neighbor was not similar enough.
    BelowThreshold { best_similarity: f32 },
    /// The index backend failed.
    IndexUnavailable,
    /// The query could not be embedded.
    EmbeddingFailed,
}

impl MissReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissReason::Empty => "empty",
            MissReason::BelowThreshold { .. } => "below_threshold",
            MissReason::IndexUnavailable => "index_unavailable",
            MissReason::EmbeddingFailed => "embedding_failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheHit {
    pub key: String,
    pub text: String,
    pub origin: Option<CacheOrigin>,
    pub similarity: f32,
}

/// Outcome of a threshold-tested cache lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    Hit(CacheHit),
    Miss(MissReason),
}

impl CacheLookup {
    #[inline]
    pub fn is_hit(&self) -> bool {
        matches!(self, CacheLookup::Hit(_))
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            CacheLookup::Hit(hit) => Some(&hit.text),
            CacheLookup::Miss(_) => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            CacheLookup::Hit(hit) => Some(hit.text),
            CacheLookup::Miss(_) => None,
        }
    }

    /// Applies `threshold` to the best (first) match.
    pub fn from_matches(matches: &[CacheMatch], threshold: f32) -> Self {
        let Some(best) = matches.first() else {
            return CacheLookup::Miss(MissReason::Empty);
        };

        let similarity = best.similarity();
        if similarity >= threshold {
            CacheLookup::Hit(CacheHit {
                key: best.key.clone(),
                text: best.text.clone(),
                origin: best.origin,
                similarity,
            })
        } else {
            CacheLookup::Miss(MissReason::BelowThreshold {
                best_similarity: similarity,
            })
        }
    }
}
