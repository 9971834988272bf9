//! API error types and the uniform response envelope.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lorekeeper_core::error::DomainError;
use lorekeeper_llm::LlmError;
use lorekeeper_proposal::application::lifecycle::ApplyOutcome;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Model client construction error.
    #[error("model client error: {0}")]
    Llm(#[from] LlmError),

    /// Schema bootstrap or other domain-level startup failure.
    #[error("startup error: {0}")]
    Startup(#[from] DomainError),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// Success half of the response envelope.
#[derive(Debug, Serialize)]
pub struct SuccessBody<T> {
    /// Always `true` on this half.
    pub success: bool,
    /// Route-specific payload.
    pub data: T,
}

/// Wraps a payload in the success envelope.
pub fn success<T: Serialize>(data: T) -> Json<SuccessBody<T>> {
    Json(SuccessBody {
        success: true,
        data,
    })
}

/// Machine- and human-readable error description.
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    /// Machine-readable error code.
    pub code: &'static str,
    /// Human-readable error message.
    pub message: String,
    /// Structured context, e.g. per-edge apply outcomes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Failure half of the response envelope.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Always `false` on this half.
    pub success: bool,
    /// The error description.
    pub error: ErrorDetail,
}

/// HTTP-layer error that implements `IntoResponse`.
///
/// Domain errors map one-to-one onto status codes; an incomplete RELATE apply
/// is its own case so the per-edge outcomes survive into the error envelope.
#[derive(Debug)]
pub enum ApiError {
    /// A domain-level failure.
    Domain(DomainError),
    /// A RELATE apply in which at least one edge write failed.
    ApplyIncomplete(ApplyOutcome),
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self::Domain(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            Self::Domain(err) => {
                let (status, code) = match &err {
                    DomainError::NotFound(..) => (StatusCode::NOT_FOUND, "not_found"),
                    DomainError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
                    DomainError::Precondition { code, .. } => (StatusCode::BAD_REQUEST, *code),
                    DomainError::Upstream(_) => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "upstream_error")
                    }
                    DomainError::Infrastructure(_) => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "infrastructure_error")
                    }
                };
                (
                    status,
                    ErrorDetail {
                        code,
                        message: err.to_string(),
                        details: None,
                    },
                )
            }
            Self::ApplyIncomplete(outcome) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "apply_incomplete",
                    message: "one or more relationship changes failed to apply".to_owned(),
                    details: serde_json::to_value(&outcome).ok(),
                },
            ),
        };

        let body = ErrorBody {
            success: false,
            error: detail,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use lorekeeper_proposal::domain::ChangeType;
    use uuid::Uuid;

    fn status_of(err: DomainError) -> StatusCode {
        let response = ApiError::from(err).into_response();
        response.status()
    }

    #[test]
    fn test_not_found_maps_to_404() {
        assert_eq!(
            status_of(DomainError::NotFound("proposal", "abc".into())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_validation_maps_to_400() {
        assert_eq!(
            status_of(DomainError::Validation("bad input".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_precondition_maps_to_400_with_its_code() {
        let response = ApiError::from(DomainError::precondition(
            "proposal_not_approved",
            "still pending",
        ))
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_upstream_and_infrastructure_map_to_500() {
        assert_eq!(
            status_of(DomainError::Upstream("model timeout".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(DomainError::Infrastructure("db down".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_apply_incomplete_carries_outcome_details() {
        let outcome = ApplyOutcome {
            proposal_id: Uuid::new_v4(),
            change_type: ChangeType::Relate,
            entity_id: None,
            relationships: vec![],
            applied: false,
        };

        let response = ApiError::ApplyIncomplete(outcome).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
