//! Domain error types.

use thiserror::Error;

/// Top-level domain error type, shared by all bounded contexts.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A referenced record does not exist. The first field names the record
    /// kind ("proposal", "template", "entity", ...), the second its id.
    #[error("{0} not found: {1}")]
    NotFound(&'static str, String),

    /// A required input field is missing or malformed.
    #[error("validation error: {0}")]
    Validation(String),

    /// An operation was attempted against a record in the wrong state, e.g.
    /// applying a proposal that is not approved.
    #[error("precondition failed ({code}): {message}")]
    Precondition {
        /// Machine-readable code surfaced in the error envelope.
        code: &'static str,
        /// Human-readable explanation.
        message: String,
    },

    /// A model-invocation call failed or timed out.
    #[error("upstream model error: {0}")]
    Upstream(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Shorthand for a precondition failure.
    #[must_use]
    pub fn precondition(code: &'static str, message: impl Into<String>) -> Self {
        Self::Precondition {
            code,
            message: message.into(),
        }
    }
}
