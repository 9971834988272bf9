//! Best-effort TTL cache for chat responses.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};

use crate::types::{ChatMessage, ChatOptions, ChatResponse};

/// Cache key: SHA-256 over the serialized (messages, model, options) triple.
pub type CacheKey = [u8; 32];

/// In-process response cache.
///
/// The lock is held only for map access, never across an await, so the only
/// race is two concurrent misses both calling upstream.
pub struct ResponseCache {
    ttl: Duration,
    entries: RwLock<HashMap<CacheKey, (Instant, ChatResponse)>>,
}

impl ResponseCache {
    /// Create a cache whose entries expire after `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Derive the key for a call.
    ///
    /// # Panics
    ///
    /// Panics if message serialization fails, which cannot happen for these
    /// plain string types.
    #[must_use]
    pub fn key(messages: &[ChatMessage], model: &str, options: &ChatOptions) -> CacheKey {
        let mut hasher = Sha256::new();
        hasher.update(serde_json::to_vec(messages).expect("messages serialize"));
        hasher.update(model.as_bytes());
        hasher.update(serde_json::to_vec(options).expect("options serialize"));
        hasher.finalize().into()
    }

    /// Look up a fresh entry; expired entries are dropped on read.
    #[must_use]
    pub fn get(&self, key: &CacheKey) -> Option<ChatResponse> {
        {
            let entries = self.entries.read().unwrap_or_else(std::sync::PoisonError::into_inner);
            match entries.get(key) {
                Some((stored_at, response)) if stored_at.elapsed() < self.ttl => {
                    return Some(response.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }
        // Entry exists but is stale; evict it under the write lock.
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.remove(key);
        None
    }

    /// Store a response under `key`.
    pub fn put(&self, key: CacheKey, response: ChatResponse) {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.insert(key, (Instant::now(), response));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Role, TokenUsage};

    fn response(text: &str) -> ChatResponse {
        ChatResponse {
            message: ChatMessage {
                role: Role::Assistant,
                content: text.to_owned(),
            },
            usage: TokenUsage::default(),
            finish_reason: "stop".to_owned(),
        }
    }

    #[test]
    fn test_put_then_get_returns_cached_response() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        let key = ResponseCache::key(&[ChatMessage::user("hi")], "m", &ChatOptions::default());

        cache.put(key, response("cached"));

        let hit = cache.get(&key).unwrap();
        assert_eq!(hit.message.content, "cached");
    }

    #[test]
    fn test_expired_entry_is_evicted_on_read() {
        let cache = ResponseCache::new(Duration::ZERO);
        let key = ResponseCache::key(&[ChatMessage::user("hi")], "m", &ChatOptions::default());

        cache.put(key, response("stale"));

        assert!(cache.get(&key).is_none());
    }

    #[test]
    fn test_key_varies_with_model_and_messages() {
        let opts = ChatOptions::default();
        let a = ResponseCache::key(&[ChatMessage::user("hi")], "m1", &opts);
        let b = ResponseCache::key(&[ChatMessage::user("hi")], "m2", &opts);
        let c = ResponseCache::key(&[ChatMessage::user("yo")], "m1", &opts);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }
}
