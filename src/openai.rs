use std::time::Instant;

use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use thiserror::Error;
use tracing::{error, info};

use crate::config::AppConfig;
use crate::models::ToolKind;
use crate::prompts::Prompts;

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("upstream error: {0}")]
    Upstream(#[from] OpenAIError),

    #[error("upstream returned no content")]
    EmptyResponse,
}

/// Everything the generator needs for one completion.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationPrompt {
    pub kind: ToolKind,
    pub prompt: String,
    pub tone: String,
    pub length: String,
}

/// Opaque text-in, text-out collaborator. Non-deterministic and potentially slow.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationPrompt) -> Result<String, GeneratorError>;
}

#[derive(Clone)]
pub struct OpenAiGenerator {
    client: Client<OpenAIConfig>,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiGenerator {
    pub fn new(app_config: &AppConfig) -> Self {
        let mut config = OpenAIConfig::new().with_api_key(&app_config.openai_api_key);
        if let Some(api_base) = &app_config.openai_api_base {
            config = config.with_api_base(api_base);
        }

        OpenAiGenerator {
            client: Client::with_config(config),
            model: app_config.openai_model.clone(),
            max_tokens: app_config.openai_max_tokens,
            temperature: app_config.openai_temperature,
        }
    }
}

#[async_trait]
impl ContentGenerator for OpenAiGenerator {
    async fn generate(&self, request: &GenerationPrompt) -> Result<String, GeneratorError> {
        let system_prompt = Prompts::system_prompt(request.kind, &request.tone, &request.length);

        let completion_request = CreateChatCompletionRequestArgs::default()
            .model(self.model.as_str())
            .max_tokens(self.max_tokens)
            .temperature(self.temperature)
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system_prompt)
                    .build()?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(request.prompt.as_str())
                    .build()?
                    .into(),
            ])
            .build()?;

        let started = Instant::now();
        let response = self
            .client
            .chat()
            .create(completion_request)
            .await
            .map_err(|e| {
                error!("Completion request failed: {:?}", e);
                GeneratorError::from(e)
            })?;

        info!(
            tool = %request.kind,
            model = %self.model,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Completion received"
        );

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|content| !content.trim().is_empty())
            .ok_or(GeneratorError::EmptyResponse)
    }
}
