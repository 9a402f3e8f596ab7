use serde::{Deserialize, Serialize};

/// Inbound chain request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainRequest {
    pub question: String,
}

impl ChainRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
        }
    }
}

/// Where an answer came from. Serialized as `CAG`, `RAG` or `NONE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AnswerSource {
    /// Served from the semantic cache.
    Cag,
    /// Produced by retrieval plus generation.
    Rag,
    /// No answer could be produced.
    None,
}

impl AnswerSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerSource::Cag => "CAG",
            AnswerSource::Rag => "RAG",
            AnswerSource::None => "NONE",
        }
    }
}

impl std::fmt::Display for AnswerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal state of one chain invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ChainOutcome {
    EmptyQuestion,
    Hit { key: String, similarity: f32 },
    NoDocs,
    GenerationFailed,
    /// `cache_key` is `None` when the write-back failed.
    Answered { cache_key: Option<String> },
}

impl ChainOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainOutcome::EmptyQuestion => "empty_question",
            ChainOutcome::Hit { .. } => "hit",
            ChainOutcome::NoDocs => "no_docs",
            ChainOutcome::GenerationFailed => "gen_failed",
            ChainOutcome::Answered { .. } => "answered",
        }
    }
}

/// Chain response: `{answer, cache_hit, source}` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainResponse {
    pub answer: String,
    pub cache_hit: bool,
    pub source: AnswerSource,
    #[serde(skip)]
    pub outcome: ChainOutcome,
}

impl ChainResponse {
    pub(crate) fn new(
        answer: impl Into<String>,
        source: AnswerSource,
        outcome: ChainOutcome,
    ) -> Self {
        Self {
            answer: answer.into(),
            cache_hit: source == AnswerSource::Cag,
            source,
            outcome,
        }
    }
}
