use std::time::Duration;

use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::{
    config::Config, constants::prompts::FAQ_SYSTEM_PROMPT, errors::GenerationError,
    models::domain::GenerationRequest,
};

/// Text-generation backend. Implementations return `Err(GenerationError::Empty)`
/// rather than an empty string.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

/// Runs one generation call under `timeout`. Blank text is reported as
/// `Empty` whichever client produced it.
pub async fn generate_with_timeout(
    client: &dyn GenerationClient,
    request: &GenerationRequest,
    timeout: Duration,
) -> Result<String, GenerationError> {
    match tokio::time::timeout(timeout, client.generate(request)).await {
        Ok(Ok(text)) if text.trim().is_empty() => Err(GenerationError::Empty),
        Ok(result) => result,
        Err(_) => Err(GenerationError::Timeout(timeout.as_secs())),
    }
}

pub struct OpenAiGenerationClient {
    client: Client<OpenAIConfig>,
    system_prompt: String,
}

impl OpenAiGenerationClient {
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(config.openai_api_key.expose_secret())
            .with_api_base(&config.openai_api_base);

        Self {
            client: Client::with_config(openai_config),
            system_prompt: FAQ_SYSTEM_PROMPT.to_string(),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    fn into_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
    }
}

#[async_trait]
impl GenerationClient for OpenAiGenerationClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let body = ChatRequest {
            model: &request.model,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &self.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
        };

        log::debug!(
            "Requesting completion for {} (model={}, temperature={:.2})",
            request.context_tag,
            request.model,
            request.temperature
        );

        let response: ChatResponse = self
            .client
            .chat()
            .create_byot(body)
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        response.into_text().ok_or(GenerationError::Empty)
    }
}
