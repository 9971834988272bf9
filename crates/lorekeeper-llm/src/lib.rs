//! Lorekeeper LLM — model invocation layer.
//!
//! Defines the provider-agnostic [`ChatClient`] trait, two concrete providers
//! (a hosted OpenAI-style API and a local Ollama-style daemon), an immutable
//! [`ModelConfig`] injected at construction, and a best-effort response cache.

mod cache;
mod client;
mod config;
mod error;
pub mod providers;
mod types;

pub use cache::ResponseCache;
pub use client::{CachedChatClient, ChatClient, client_from_config};
pub use config::{ModelConfig, ProviderKind};
pub use error::LlmError;
pub use types::{ChatMessage, ChatOptions, ChatResponse, Role, TokenUsage};
