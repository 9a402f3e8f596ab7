//! Chat-model generator backed by the `genai` multi-provider client.
//!
//! Model names without a provider prefix (e.g. `llama3.2:3b`) are served by a local Ollama.

use async_trait::async_trait;
use genai::Client;
use genai::chat::{ChatMessage, ChatOptions, ChatRequest};
use tracing::{debug, instrument};

use super::{GenerationError, Generator};

pub const DEFAULT_SYSTEM_PROMPT: &str = "\
당신은 관세청 공식 자료를 근거로 답변하는 안내 에이전트입니다.
1. 제공된 [참고 자료]에서만 근거를 찾으세요.
2. 자료에 근거가 없으면 \"제공된 자료에서 관련 정보를 찾을 수 없습니다.\"라고 답하세요.
3. 자료에 없는 내용을 추측하지 마세요.
4. 모든 답변은 한국어 마크다운으로 작성하세요.";

pub struct GenaiGenerator {
    client: Client,
    model: String,
    system_prompt: String,
    temperature: f64,
}

impl std::fmt::Debug for GenaiGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenaiGenerator")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

impl GenaiGenerator {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: Client::default(),
            model: model.into(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            temperature: 0.0,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub(crate) fn build_request(&self, question: &str, context: &str) -> ChatRequest {
        ChatRequest::new(vec![
            ChatMessage::system(self.system_prompt.clone()),
            ChatMessage::user(user_prompt(question, context)),
        ])
    }
}

pub(crate) fn user_prompt(question: &str, context: &str) -> String {
    format!("[참고 자료]\n{context}\n---\n[질문]\n{question}")
}

#[async_trait]
impl Generator for GenaiGenerator {
    #[instrument(skip(self, question, context), fields(model = %self.model, context_len = context.len()))]
    async fn generate(&self, question: &str, context: &str) -> Result<String, GenerationError> {
        let request = self.build_request(question, context);
        let options = ChatOptions::default().with_temperature(self.temperature);

        let response = self
            .client
            .exec_chat(&self.model, request, Some(&options))
            .await
            .map_err(|e| GenerationError::from_provider_message(e.to_string()))?;

        let answer = response.first_text().unwrap_or_default().trim().to_string();
        if answer.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }

        debug!(answer_len = answer.len(), "Answer generated");
        Ok(answer)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
