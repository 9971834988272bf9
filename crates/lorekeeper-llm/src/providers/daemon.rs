//! Local Ollama-style daemon provider.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::client::ChatClient;
use crate::config::ModelConfig;
use crate::error::LlmError;
use crate::types::{ChatMessage, ChatOptions, ChatResponse, Role, TokenUsage};

/// Chat client for a local daemon exposing `/api/chat`.
#[derive(Debug, Clone)]
pub struct LocalDaemonClient {
    http: reqwest::Client,
    config: Arc<ModelConfig>,
}

#[derive(Debug, Serialize)]
struct DaemonRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<DaemonOptions>,
}

#[derive(Debug, Serialize)]
struct DaemonOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct DaemonResponse {
    message: ChatMessage,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    prompt_eval_count: u32,
    #[serde(default)]
    eval_count: u32,
}

fn into_chat_response(dto: DaemonResponse) -> ChatResponse {
    ChatResponse {
        message: ChatMessage {
            role: Role::Assistant,
            content: dto.message.content,
        },
        usage: TokenUsage {
            prompt_tokens: dto.prompt_eval_count,
            completion_tokens: dto.eval_count,
            total_tokens: dto.prompt_eval_count + dto.eval_count,
        },
        finish_reason: dto.done_reason.unwrap_or_else(|| "stop".to_owned()),
    }
}

impl LocalDaemonClient {
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
impl ChatClient for LocalDaemonClient {
    #[instrument(skip(self, messages, options), fields(provider = "local-daemon"))]
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

        let daemon_options =
            if options.temperature.is_some() || options.max_tokens.is_some() {
                Some(DaemonOptions {
                    temperature: options.temperature,
                    num_predict: options.max_tokens,
                })
            } else {
                None
            };

        let body = DaemonRequest {
            model,
            messages,
            stream: false,
            options: daemon_options,
        };

        let url = format!("{}/api/chat", self.config.base_url);
        let response = self.http.post(&url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "daemon returned error status");
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let dto: DaemonResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Decode(e.to_string()))?;

        Ok(into_chat_response(dto))
    }

    fn provider_name(&self) -> &'static str {
        "local-daemon"
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daemon_response_maps_token_counts_into_usage() {
        let raw = r#"{
            "message": {"role": "assistant", "content": "hi there"},
            "done_reason": "stop",
            "prompt_eval_count": 20,
            "eval_count": 5
        }"#;
        let dto: DaemonResponse = serde_json::from_str(raw).unwrap();

        let response = into_chat_response(dto);

        assert_eq!(response.message.content, "hi there");
        assert_eq!(response.usage.prompt_tokens, 20);
        assert_eq!(response.usage.completion_tokens, 5);
        assert_eq!(response.usage.total_tokens, 25);
    }

    #[test]
    fn test_missing_counters_default_to_zero() {
        let raw = r#"{"message": {"role": "assistant", "content": "x"}}"#;
        let dto: DaemonResponse = serde_json::from_str(raw).unwrap();

        let response = into_chat_response(dto);

        assert_eq!(response.usage, TokenUsage::default());
        assert_eq!(response.finish_reason, "stop");
    }
}
