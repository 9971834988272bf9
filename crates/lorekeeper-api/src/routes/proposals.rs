//! Routes for the proposal lifecycle, queries, apply, and generation.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Json, Router, routing::get, routing::post};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use lorekeeper_proposal::application::generator::{GenerateProposalRequest, generate_proposal};
use lorekeeper_proposal::application::{lifecycle, queries};
use lorekeeper_proposal::domain::{ProposalDraft, ProposalStatus};
use lorekeeper_proposal::store::ProposalFilter;

use crate::error::{ApiError, success};
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct CreateProposalRequest {
    /// The proposal payload.
    #[serde(flatten)]
    pub proposal: ProposalDraft,
    /// Author recorded on the proposal.
    #[serde(rename = "createdBy")]
    pub created_by: String,
}

/// Request body for PATCH /{id}.
#[derive(Debug, Deserialize)]
pub struct UpdateProposalRequest {
    /// New title, if any.
    #[serde(default)]
    pub title: Option<String>,
    /// New description, if any.
    #[serde(default)]
    pub description: Option<String>,
    /// New reason, if any.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Request body for POST /{id}/comments.
#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    /// Comment body.
    pub content: String,
    /// Comment author.
    pub author: String,
}

/// Request body for POST /{id}/review.
#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    /// Target status.
    pub status: ProposalStatus,
    /// Reviewer id.
    #[serde(alias = "reviewedBy")]
    pub reviewer: String,
    /// Optional review comment.
    #[serde(default)]
    pub comment: Option<String>,
}

/// Request body for POST /{id}/apply.
#[derive(Debug, Deserialize)]
pub struct ApplyRequest {
    /// Who requested the apply; recorded in the system comment.
    #[serde(alias = "appliedBy")]
    pub applied_by: String,
}

/// Request body for POST /generate.
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    /// Generation parameters.
    #[serde(flatten)]
    pub request: GenerateProposalRequest,
    /// Author recorded on the generated proposal; defaults to "system".
    #[serde(default, rename = "createdBy")]
    pub created_by: Option<String>,
}

/// POST /
#[instrument(skip(state, request))]
async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateProposalRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let proposal = lifecycle::create_proposal(
        request.proposal,
        &request.created_by,
        state.clock.as_ref(),
        state.proposals.as_ref(),
    )
    .await?;

    Ok((StatusCode::CREATED, success(proposal)))
}

/// GET /
#[instrument(skip(state, filter))]
async fn list(
    State(state): State<AppState>,
    Query(filter): Query<ProposalFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let proposals = queries::list_proposals(&filter, state.proposals.as_ref()).await?;
    Ok(success(proposals))
}

/// GET /{id}
#[instrument(skip(state), fields(proposal_id = %id))]
async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let proposal = queries::get_proposal(id, state.proposals.as_ref()).await?;
    Ok(success(proposal))
}

/// PATCH /{id}
#[instrument(skip(state, request), fields(proposal_id = %id))]
async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateProposalRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let proposal = lifecycle::update_proposal(
        id,
        request.title,
        request.description,
        request.reason,
        state.proposals.as_ref(),
    )
    .await?;
    Ok(success(proposal))
}

/// DELETE /{id}
#[instrument(skip(state), fields(proposal_id = %id))]
async fn remove(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    lifecycle::delete_proposal(id, state.proposals.as_ref()).await?;
    Ok(success(serde_json::json!({ "deleted": true })))
}

/// POST /{id}/comments
#[instrument(skip(state, request), fields(proposal_id = %id))]
async fn comment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<CommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let proposal = lifecycle::add_comment(
        id,
        &request.content,
        &request.author,
        state.clock.as_ref(),
        state.proposals.as_ref(),
    )
    .await?;
    Ok(success(proposal))
}

/// POST /{id}/review
#[instrument(skip(state, request), fields(proposal_id = %id))]
async fn review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ReviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let proposal = lifecycle::review_proposal(
        id,
        request.status,
        &request.reviewer,
        request.comment,
        state.clock.as_ref(),
        state.proposals.as_ref(),
    )
    .await?;
    Ok(success(proposal))
}

/// POST /{id}/apply
#[instrument(skip(state, request), fields(proposal_id = %id))]
async fn apply(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ApplyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = lifecycle::apply_proposal(
        id,
        &request.applied_by,
        state.clock.as_ref(),
        state.proposals.as_ref(),
        &state.repositories,
        state.relationship_writer.as_ref(),
    )
    .await?;

    if outcome.applied {
        Ok(success(outcome))
    } else {
        Err(ApiError::ApplyIncomplete(outcome))
    }
}

/// POST /generate
#[instrument(skip(state, request))]
async fn generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let author = request.created_by.as_deref().unwrap_or("system");

    let proposal = generate_proposal(
        request.request,
        author,
        state.clock.as_ref(),
        state.proposals.as_ref(),
        state.templates.as_ref(),
        &state.repositories,
        state.chat.as_ref(),
    )
    .await?;

    info!(proposal_id = %proposal.id, "proposal generated");
    Ok((StatusCode::CREATED, success(proposal)))
}

/// Returns the proposal router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create).get(list))
        .route("/generate", post(generate))
        .route("/{id}", get(get_by_id).patch(update).delete(remove))
        .route("/{id}/comments", post(comment))
        .route("/{id}/review", post(review))
        .route("/{id}/apply", post(apply))
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::http::Request;
    use chrono::{TimeZone, Utc};
    use lorekeeper_core::entity::EntityKind;
    use lorekeeper_core::repository::EntityRepositorySet;
    use lorekeeper_proposal::testing::{InMemoryProposalStore, InMemoryTemplateStore};
    use lorekeeper_test_support::{
        FixedClock, RecordingEntityRepository, RecordingRelationshipWriter, ScriptedChatClient,
    };
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        state_with_writer(RecordingRelationshipWriter::new())
    }

    fn state_with_writer(writer: RecordingRelationshipWriter) -> AppState {
        AppState {
            clock: Arc::new(FixedClock(
                Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
            )),
            proposals: Arc::new(InMemoryProposalStore::new()),
            templates: Arc::new(InMemoryTemplateStore::new()),
            repositories: Arc::new(EntityRepositorySet::uniform(Arc::new(
                RecordingEntityRepository::new(EntityKind::Character),
            ))),
            relationship_writer: Arc::new(writer),
            chat: Arc::new(ScriptedChatClient::new(
                r#"{"type":"update","title":"Generated change"}"#,
            )),
        }
    }

    async fn send(
        state: &AppState,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let app = router().with_state(state.clone());
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        (status, json)
    }

    fn update_body() -> Value {
        json!({
            "change_type": "update",
            "entity_kind": "character",
            "entity_id": "char-1",
            "title": "Raise strength",
            "changes": [{ "name": "strength", "new_value": 14 }],
            "createdBy": "gm"
        })
    }

    #[tokio::test]
    async fn test_create_returns_201_pending() {
        // Arrange
        let state = test_state();

        // Act
        let (status, json) = send(&state, "POST", "/", Some(update_body())).await;

        // Assert
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["success"], json!(true));
        assert_eq!(json["data"]["status"], json!("pending"));
        assert_eq!(json["data"]["created_by"], json!("gm"));
    }

    #[tokio::test]
    async fn test_create_without_change_type_returns_400() {
        let state = test_state();
        let body = json!({ "entity_kind": "character", "createdBy": "gm" });

        let (status, json) = send(&state, "POST", "/", Some(body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], json!(false));
        assert_eq!(json["error"]["code"], json!("validation_error"));
    }

    #[tokio::test]
    async fn test_get_unknown_returns_404_envelope() {
        let state = test_state();

        let (status, json) = send(&state, "GET", &format!("/{}", Uuid::new_v4()), None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], json!("not_found"));
    }

    #[tokio::test]
    async fn test_list_applies_query_filter() {
        let state = test_state();
        send(&state, "POST", "/", Some(update_body())).await;
        let mut other = update_body();
        other["entity_kind"] = json!("location");
        other["entity_id"] = json!("loc-1");
        send(&state, "POST", "/", Some(other)).await;

        let (status, json) = send(&state, "GET", "/?entityType=location", None).await;

        assert_eq!(status, StatusCode::OK);
        let listed = json["data"].as_array().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["entity_kind"], json!("location"));
    }

    #[tokio::test]
    async fn test_review_approves_and_stamps_reviewer() {
        let state = test_state();
        let (_, created) = send(&state, "POST", "/", Some(update_body())).await;
        let id = created["data"]["id"].as_str().unwrap().to_owned();

        let (status, json) = send(
            &state,
            "POST",
            &format!("/{id}/review"),
            Some(json!({ "status": "approved", "reviewer": "alice", "comment": "ship it" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["status"], json!("approved"));
        assert_eq!(json["data"]["reviewed_by"], json!("alice"));
        assert_eq!(json["data"]["comments"][0]["content"], json!("ship it"));
    }

    #[tokio::test]
    async fn test_review_back_to_pending_returns_400() {
        let state = test_state();
        let (_, created) = send(&state, "POST", "/", Some(update_body())).await;
        let id = created["data"]["id"].as_str().unwrap().to_owned();

        let (status, json) = send(
            &state,
            "POST",
            &format!("/{id}/review"),
            Some(json!({ "status": "pending", "reviewer": "alice" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], json!("invalid_transition"));
    }

    #[tokio::test]
    async fn test_apply_pending_returns_400() {
        let state = test_state();
        let (_, created) = send(&state, "POST", "/", Some(update_body())).await;
        let id = created["data"]["id"].as_str().unwrap().to_owned();

        let (status, json) = send(
            &state,
            "POST",
            &format!("/{id}/apply"),
            Some(json!({ "applied_by": "gm" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], json!("proposal_not_approved"));
    }

    #[tokio::test]
    async fn test_apply_approved_update_reports_entity_id() {
        let state = test_state();
        let (_, created) = send(&state, "POST", "/", Some(update_body())).await;
        let id = created["data"]["id"].as_str().unwrap().to_owned();
        send(
            &state,
            "POST",
            &format!("/{id}/review"),
            Some(json!({ "status": "approved", "reviewer": "alice" })),
        )
        .await;

        let (status, json) = send(
            &state,
            "POST",
            &format!("/{id}/apply"),
            Some(json!({ "applied_by": "gm" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["applied"], json!(true));
        assert_eq!(json["data"]["entity_id"], json!("char-1"));
    }

    #[tokio::test]
    async fn test_apply_relate_partial_failure_returns_edge_details() {
        // Arrange — two edges, one of which the writer refuses.
        let writer = RecordingRelationshipWriter::new();
        writer.fail_for_type("BETRAYS");
        let state = state_with_writer(writer);

        let edge = |relationship_type: &str| {
            json!({
                "source_id": "a", "source_kind": "character",
                "target_id": "b", "target_kind": "location",
                "relationship_type": relationship_type
            })
        };
        let body = json!({
            "change_type": "relate",
            "entity_kind": "relationship",
            "title": "New alliances",
            "relationship_changes": [edge("ALLIED_WITH"), edge("BETRAYS")],
            "createdBy": "gm"
        });
        let (_, created) = send(&state, "POST", "/", Some(body)).await;
        let id = created["data"]["id"].as_str().unwrap().to_owned();
        send(
            &state,
            "POST",
            &format!("/{id}/review"),
            Some(json!({ "status": "approved", "reviewer": "alice" })),
        )
        .await;

        // Act
        let (status, json) = send(
            &state,
            "POST",
            &format!("/{id}/apply"),
            Some(json!({ "applied_by": "gm" })),
        )
        .await;

        // Assert — error envelope carries the per-edge outcomes.
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"]["code"], json!("apply_incomplete"));
        let edges = json["error"]["details"]["relationships"].as_array().unwrap();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0]["success"], json!(true));
        assert_eq!(edges[1]["success"], json!(false));
    }

    #[tokio::test]
    async fn test_generate_returns_201_with_parsed_proposal() {
        let state = test_state();

        let (status, json) = send(
            &state,
            "POST",
            "/generate",
            Some(json!({ "entityType": "character", "createdBy": "gm" })),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["data"]["title"], json!("Generated change"));
        assert_eq!(json["data"]["status"], json!("pending"));
        assert_eq!(json["data"]["created_by"], json!("gm"));
    }

    #[tokio::test]
    async fn test_comment_with_empty_content_returns_400() {
        let state = test_state();
        let (_, created) = send(&state, "POST", "/", Some(update_body())).await;
        let id = created["data"]["id"].as_str().unwrap().to_owned();

        let (status, json) = send(
            &state,
            "POST",
            &format!("/{id}/comments"),
            Some(json!({ "content": "  ", "author": "gm" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], json!("validation_error"));
    }
}
