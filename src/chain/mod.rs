//! Cache-first question answering.
//!
//! One invocation walks `CACHE_LOOKUP → (HIT | RETRIEVE → GENERATE → WRITE_BACK)`:
//!
//! - blank question: fixed prompt, source `NONE`
//! - cache hit at or above the threshold: cached text, source `CAG`
//! - retrieval failure or no passages: fixed apology, source `NONE`, nothing cached
//! - generation failure: fixed error message, source `RAG`, nothing cached
//! - otherwise: generated answer, source `RAG`, written back as a dynamic entry
//!
//! [`CacheChain::answer`] never returns an error.

pub mod config;
mod pipeline;
pub mod types;

#[cfg(test)]
mod tests;

pub use config::{ChainConfig, ChainMessages};
pub use pipeline::{CacheChain, format_context};
pub use types::{AnswerSource, ChainOutcome, ChainRequest, ChainResponse};
