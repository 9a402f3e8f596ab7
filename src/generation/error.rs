use thiserror::Error;

#[derive(Debug, Clone, Error)]
/// Errors returned by answer generators.
pub enum GenerationError {
    /// Generation did not finish in time.
    #[error("generation timed out after {millis} ms")]
    Timeout { millis: u64 },

    /// The model server could not be reached.
    #[error("cannot reach the generation backend: {reason}")]
    Connection { reason: String },

    /// The provider returned an error.
    #[error("generation provider error: {reason}")]
    Provider { reason: String },

    /// The model returned no text.
    #[error("generation returned an empty answer")]
    EmptyResponse,
}

impl GenerationError {
    /// Classifies a provider error message, separating transport failures.
    pub(crate) fn from_provider_message(message: String) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("connect") {
            GenerationError::Connection { reason: message }
        } else {
            GenerationError::Provider { reason: message }
        }
    }
}
