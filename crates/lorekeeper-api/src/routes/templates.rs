//! Routes for proposal template management.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Json, Router, routing::get, routing::post};
use lorekeeper_core::entity::EntityKind;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use lorekeeper_proposal::application::templates;
use lorekeeper_proposal::domain::TemplateDraft;

use crate::error::{ApiError, success};
use crate::state::AppState;

/// Query parameters for GET /.
#[derive(Debug, Default, Deserialize)]
pub struct ListTemplatesQuery {
    /// Restrict to one entity kind.
    #[serde(rename = "entityType")]
    pub entity_kind: Option<EntityKind>,
}

/// Request body for POST /{id}/render.
#[derive(Debug, Default, Deserialize)]
pub struct RenderRequest {
    /// Placeholder values substituted into the prompt body.
    #[serde(default)]
    pub variables: HashMap<String, String>,
}

/// Response body for POST /{id}/render.
#[derive(Debug, Serialize)]
pub struct RenderResponse {
    /// The rendered prompt.
    pub rendered: String,
}

/// POST /
#[instrument(skip(state, draft))]
async fn create(
    State(state): State<AppState>,
    Json(draft): Json<TemplateDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let template =
        templates::create_template(draft, state.clock.as_ref(), state.templates.as_ref()).await?;
    Ok((StatusCode::CREATED, success(template)))
}

/// GET /
#[instrument(skip(state))]
async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListTemplatesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let listed = state.templates.list(query.entity_kind).await?;
    Ok(success(listed))
}

/// GET /{id}
#[instrument(skip(state), fields(template_id = %id))]
async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let template = templates::get_template(id, state.templates.as_ref()).await?;
    Ok(success(template))
}

/// PATCH /{id}
#[instrument(skip(state, draft), fields(template_id = %id))]
async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(draft): Json<TemplateDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let template = templates::update_template(id, draft, state.templates.as_ref()).await?;
    Ok(success(template))
}

/// DELETE /{id}
#[instrument(skip(state), fields(template_id = %id))]
async fn remove(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    templates::delete_template(id, state.templates.as_ref()).await?;
    Ok(success(serde_json::json!({ "deleted": true })))
}

/// POST /{id}/render
#[instrument(skip(state, request), fields(template_id = %id))]
async fn render(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<RenderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let rendered =
        templates::render_preview(id, &request.variables, state.templates.as_ref()).await?;
    Ok(success(RenderResponse { rendered }))
}

/// Returns the template router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create).get(list))
        .route("/{id}", get(get_by_id).patch(update).delete(remove))
        .route("/{id}/render", post(render))
}
