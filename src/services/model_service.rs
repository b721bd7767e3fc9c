use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;

use crate::errors::{AppError, AppResult};

/// A single chat completion that must answer with a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: f32,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModelService: Send + Sync {
    /// Raw text of the first choice; callers parse it.
    async fn complete_json(&self, request: ChatRequest) -> AppResult<String>;
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Any OpenAI-compatible chat completions endpoint.
pub struct OpenAiModelService {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiModelService {
    pub fn new(api_key: &SecretString, api_base: &str, model: &str) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key.expose_secret())
            .with_api_base(api_base);

        Self {
            client: Client::with_config(config),
            model: model.to_string(),
        }
    }

    fn request_body(&self, request: &ChatRequest) -> serde_json::Value {
        json!({
            "model": self.model,
            "temperature": request.temperature,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": request.system_prompt },
                { "role": "user", "content": request.user_prompt },
            ],
        })
    }
}

#[async_trait]
impl ModelService for OpenAiModelService {
    async fn complete_json(&self, request: ChatRequest) -> AppResult<String> {
        log::info!(
            "Requesting completion from {} (temperature {})",
            self.model,
            request.temperature
        );

        let response: ChatCompletionResponse = self
            .client
            .chat()
            .create_byot(self.request_body(&request))
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| AppError::MalformedLlmOutput("empty completion".to_string()))
    }
}
