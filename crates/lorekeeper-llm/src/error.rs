//! Model invocation error types.

use lorekeeper_core::error::DomainError;
use thiserror::Error;

/// Errors surfaced by chat providers.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The request never completed: connection refused, DNS failure,
    /// or the configured timeout elapsed.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("provider returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for log context.
        body: String,
    },

    /// The provider answer did not match the expected shape.
    #[error("malformed provider response: {0}")]
    Decode(String),
}

impl From<LlmError> for DomainError {
    fn from(err: LlmError) -> Self {
        DomainError::Upstream(err.to_string())
    }
}
