//! Document → question/answer pairs for pre-populating the cache.

mod document;
mod error;
mod extractor;
mod loader;
mod pattern;


pub use document::{DocumentPage, QaPair, Table};
pub use error::IngestError;
pub use extractor::DocumentIngestor;
pub use loader::load_document;
pub use pattern::{KOREAN_QUESTION_ENDINGS, QuestionPattern};
