//! Answer generation from a question and retrieved context.

pub mod chat;
mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;


use async_trait::async_trait;

pub use error::GenerationError;
pub use chat::{DEFAULT_SYSTEM_PROMPT, GenaiGenerator};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockGenerator;

/// Question + labeled context → answer text.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, question: &str, context: &str) -> Result<String, GenerationError>;

    /// Model name (for logs).
    fn model_id(&self) -> &str;
}
