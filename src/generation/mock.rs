//! Scripted generator for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{GenerationError, Generator};

#[derive(Debug)]
pub struct MockGenerator {
    answer: RwLock<String>,
    failure: RwLock<Option<GenerationError>>,
    delay: RwLock<Option<Duration>>,
    calls: AtomicUsize,
    last_context: RwLock<Option<String>>,
}

impl MockGenerator {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: RwLock::new(answer.into()),
            failure: RwLock::new(None),
            delay: RwLock::new(None),
            calls: AtomicUsize::new(0),
            last_context: RwLock::new(None),
        }
    }

    pub fn set_answer(&self, answer: impl Into<String>) {
        *self.answer.write() = answer.into();
    }

    /// Makes every call fail with `error` (`None` restores success).
    pub fn set_failure(&self, error: Option<GenerationError>) {
        *self.failure.write() = error;
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.write() = delay;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_context(&self) -> Option<String> {
        self.last_context.read().clone()
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(&self, _question: &str, context: &str) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_context.write() = Some(context.to_string());

        let delay = *self.delay.read();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self.failure.read().clone();
        if let Some(error) = failure {
            return Err(error);
        }

        let answer = self.answer.read().trim().to_string();
        if answer.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(answer)
    }

    fn model_id(&self) -> &str {
        "mock"
    }
}
