//! Model invocation configuration.

use std::time::Duration;

/// Which concrete provider to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Hosted OpenAI-style chat-completions API.
    HostedApi,
    /// Local Ollama-style daemon.
    LocalDaemon,
}

/// Process-wide model configuration.
///
/// Read-mostly and never mutated in place: callers hold it behind an `Arc`
/// and replace the whole object to reconfigure, so concurrent readers always
/// see a fully-formed configuration. Constructed once at startup and injected
/// into provider constructors; nothing reads it from ambient global state.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Provider flavor.
    pub provider: ProviderKind,
    /// Base URL of the provider endpoint.
    pub base_url: String,
    /// Bearer key for hosted providers; ignored by the local daemon.
    pub api_key: Option<String>,
    /// Model used when neither template nor request names one.
    pub default_model: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Response cache time-to-live; `None` disables caching.
    pub cache_ttl: Option<Duration>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::LocalDaemon,
            base_url: "http://localhost:11434".to_owned(),
            api_key: None,
            default_model: "llama3".to_owned(),
            timeout: Duration::from_secs(60),
            cache_ttl: Some(Duration::from_secs(300)),
        }
    }
}
