//! The provider-agnostic chat client trait and the caching wrapper.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::cache::ResponseCache;
use crate::config::{ModelConfig, ProviderKind};
use crate::error::LlmError;
use crate::providers::{HostedApiClient, LocalDaemonClient};
use crate::types::{ChatMessage, ChatOptions, ChatResponse};

/// Core trait all chat providers implement.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Send one ordered message list and return one completion.
    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<ChatResponse, LlmError>;

    /// Provider name, e.g. "hosted-api" or "local-daemon".
    fn provider_name(&self) -> &'static str;

    /// Model used when the call names none.
    fn default_model(&self) -> &str;
}

/// Wraps a provider with a best-effort TTL response cache.
///
/// The cache is keyed by the exact (messages, model, options) triple.
/// Overlapping requests may race on a miss; the worst case is one duplicate
/// upstream call, never corrupted data.
pub struct CachedChatClient {
    inner: Arc<dyn ChatClient>,
    cache: ResponseCache,
}

impl CachedChatClient {
    /// Wrap `inner` with a cache of the given time-to-live.
    #[must_use]
    pub fn new(inner: Arc<dyn ChatClient>, ttl: std::time::Duration) -> Self {
        Self {
            inner,
            cache: ResponseCache::new(ttl),
        }
    }
}

#[async_trait]
impl ChatClient for CachedChatClient {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<ChatResponse, LlmError> {
        let model = options
            .model
            .as_deref()
            .unwrap_or_else(|| self.inner.default_model());
        let key = ResponseCache::key(messages, model, options);

        if let Some(hit) = self.cache.get(&key) {
            debug!(provider = self.inner.provider_name(), "chat cache hit");
            return Ok(hit);
        }

        let response = self.inner.chat(messages, options).await?;
        self.cache.put(key, response.clone());
        Ok(response)
    }

    fn provider_name(&self) -> &'static str {
        self.inner.provider_name()
    }

    fn default_model(&self) -> &str {
        self.inner.default_model()
    }
}

/// Builds the configured provider, cached if the config asks for it.
///
/// # Errors
///
/// Returns [`LlmError::Transport`] if the underlying HTTP client cannot be
/// constructed.
pub fn client_from_config(config: &Arc<ModelConfig>) -> Result<Arc<dyn ChatClient>, LlmError> {
    let inner: Arc<dyn ChatClient> = match config.provider {
        ProviderKind::HostedApi => Arc::new(HostedApiClient::new(Arc::clone(config))?),
        ProviderKind::LocalDaemon => Arc::new(LocalDaemonClient::new(Arc::clone(config))?),
    };

    Ok(match config.cache_ttl {
        Some(ttl) => Arc::new(CachedChatClient::new(inner, ttl)),
        None => inner,
    })
}
