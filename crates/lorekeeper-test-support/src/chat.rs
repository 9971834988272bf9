//! Scripted chat clients for generator tests.

use std::sync::Mutex;

use async_trait::async_trait;
use lorekeeper_llm::{ChatClient, ChatMessage, ChatOptions, ChatResponse, LlmError, Role, TokenUsage};

/// A chat client that returns a fixed completion and records every call.
pub struct ScriptedChatClient {
    content: String,
    calls: Mutex<Vec<(Vec<ChatMessage>, ChatOptions)>>,
}

impl ScriptedChatClient {
    /// Create a client that always completes with `content`.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of all (messages, options) pairs sent so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn calls(&self) -> Vec<(Vec<ChatMessage>, ChatOptions)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatClient for ScriptedChatClient {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<ChatResponse, LlmError> {
        self.calls
            .lock()
            .unwrap()
            .push((messages.to_vec(), options.clone()));
        Ok(ChatResponse {
            message: ChatMessage {
                role: Role::Assistant,
                content: self.content.clone(),
            },
            usage: TokenUsage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            },
            finish_reason: "stop".to_owned(),
        })
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "test-model"
    }
}

/// A chat client that always fails, as an unreachable upstream would.
#[derive(Debug)]
pub struct FailingChatClient;

#[async_trait]
impl ChatClient for FailingChatClient {
    async fn chat(
        &self,
        _messages: &[ChatMessage],
        _options: &ChatOptions,
    ) -> Result<ChatResponse, LlmError> {
        Err(LlmError::Status {
            status: 503,
            body: "model backend unavailable".to_owned(),
        })
    }

    fn provider_name(&self) -> &'static str {
        "failing"
    }

    fn default_model(&self) -> &str {
        "test-model"
    }
}
