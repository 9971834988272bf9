//! Hosted OpenAI-style chat-completions provider.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::client::ChatClient;
use crate::config::ModelConfig;
use crate::error::LlmError;
use crate::types::{ChatMessage, ChatOptions, ChatResponse, Role, TokenUsage};

/// Chat client for a hosted `/v1/chat/completions` API.
#[derive(Debug, Clone)]
pub struct HostedApiClient {
    http: reqwest::Client,
    config: Arc<ModelConfig>,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<UsageDto>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageDto {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

fn into_chat_response(dto: CompletionResponse) -> Result<ChatResponse, LlmError> {
    let choice = dto
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::Decode("response contained no choices".to_owned()))?;

    let usage = dto.usage.map_or_else(TokenUsage::default, |u| TokenUsage {
        prompt_tokens: u.prompt_tokens,
        completion_tokens: u.completion_tokens,
        total_tokens: u.total_tokens,
    });

    Ok(ChatResponse {
        message: ChatMessage {
            role: Role::Assistant,
            content: choice.message.content,
        },
        usage,
        finish_reason: choice.finish_reason.unwrap_or_else(|| "stop".to_owned()),
    })
}

impl HostedApiClient {
    /// Build a client against `config.base_url` with the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: Arc<ModelConfig>) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { http, config })
    }
}

#[async_trait]
impl ChatClient for HostedApiClient {
    #[instrument(skip(self, messages, options), fields(provider = "hosted-api"))]
    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<ChatResponse, LlmError> {
        let model = options
            .model
            .as_deref()
            .unwrap_or(&self.config.default_model);

        debug!(model, message_count = messages.len(), "sending chat request");

        let body = CompletionRequest {
            model,
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        let url = format!("{}/v1/chat/completions", self.config.base_url);
        let mut request = self.http.post(&url).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "hosted API returned error status");
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let dto: CompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Decode(e.to_string()))?;

        into_chat_response(dto)
    }

    fn provider_name(&self) -> &'static str {
        "hosted-api"
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }
}
