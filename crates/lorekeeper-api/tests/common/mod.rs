//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{TimeZone, Utc};
use http_body_util::BodyExt;
use tower::ServiceExt;

use lorekeeper_api::routes;
use lorekeeper_api::state::AppState;
use lorekeeper_core::entity::EntityKind;
use lorekeeper_core::repository::EntityRepositorySet;
use lorekeeper_llm::ChatClient;
use lorekeeper_proposal::testing::{InMemoryProposalStore, InMemoryTemplateStore};
use lorekeeper_test_support::{
    FixedClock, RecordingEntityRepository, RecordingRelationshipWriter, ScriptedChatClient,
};

/// Builds app state over in-memory stores, a fixed clock, and the given
/// chat client.
pub fn state_with_chat(chat: Arc<dyn ChatClient>) -> AppState {
    AppState {
        clock: Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
        )),
        proposals: Arc::new(InMemoryProposalStore::new()),
        templates: Arc::new(InMemoryTemplateStore::new()),
        repositories: Arc::new(EntityRepositorySet::uniform(Arc::new(
            RecordingEntityRepository::new(EntityKind::Character),
        ))),
        relationship_writer: Arc::new(RecordingRelationshipWriter::new()),
        chat,
    }
}

/// Default test state: scripted model client returning a parseable UPDATE.
pub fn test_state() -> AppState {
    state_with_chat(Arc::new(ScriptedChatClient::new(
        r#"{"type":"update","title":"Generated change","description":"From the model"}"#,
    )))
}

/// Build the full app router with the same route structure as `main.rs`.
pub fn app(state: &AppState) -> Router {
    routes::api_router().with_state(state.clone())
}

/// Send a request with an optional JSON body and return status plus the
/// decoded body.
pub async fn send(
    state: &AppState,
    method: &str,
    uri: &str,
    body: Option<&serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app(state).oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a POST request with a JSON body.
pub async fn post_json(
    state: &AppState,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(state, "POST", uri, Some(body)).await
}

/// Send a GET request.
pub async fn get_json(state: &AppState, uri: &str) -> (StatusCode, serde_json::Value) {
    send(state, "GET", uri, None).await
}
