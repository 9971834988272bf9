//! Integration tests for proposal generation.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use lorekeeper_test_support::{FailingChatClient, ScriptedChatClient};
use serde_json::json;

#[tokio::test]
async fn test_generate_with_template_uses_its_model() {
    let state = common::test_state();

    // Register a template for locations with its own default model.
    let (status, template) = common::post_json(
        &state,
        "/api/v1/templates",
        &json!({
            "name": "Location shakeup",
            "entity_kind": "location",
            "prompt_template": "Change {{entityType}} {{entityId}}",
            "default_model": "campaign-tuned"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let template_id = template["data"]["id"].as_str().unwrap().to_owned();

    // Generate against it explicitly.
    let (status, generated) = common::post_json(
        &state,
        "/api/v1/proposals/generate",
        &json!({ "entityType": "location", "promptId": template_id, "createdBy": "gm" }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(generated["data"]["status"], json!("pending"));
    assert_eq!(generated["data"]["llm_model"], json!("campaign-tuned"));
    assert_eq!(
        generated["data"]["prompt_id"],
        template["data"]["id"]
    );
}

#[tokio::test]
async fn test_generate_with_unknown_template_returns_404() {
    let state = common::test_state();

    let (status, json) = common::post_json(
        &state,
        "/api/v1/proposals/generate",
        &json!({
            "entityType": "character",
            "promptId": "00000000-0000-0000-0000-000000000001"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], json!("not_found"));
}

#[tokio::test]
async fn test_unparsable_model_output_still_creates_a_proposal() {
    let raw = "I would simply make the dragon angrier.";
    let state = common::state_with_chat(Arc::new(ScriptedChatClient::new(raw)));

    let (status, json) = common::post_json(
        &state,
        "/api/v1/proposals/generate",
        &json!({ "entityType": "character" }),
    )
    .await;

    // Parse failure is not an error: a fallback proposal comes back.
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["status"], json!("pending"));
    assert_eq!(json["data"]["title"], json!("Unparseable model response"));
    let comment = json["data"]["comments"][0]["content"].as_str().unwrap();
    assert!(comment.contains(raw));
}

#[tokio::test]
async fn test_model_failure_maps_to_upstream_error() {
    let state = common::state_with_chat(Arc::new(FailingChatClient));

    let (status, json) = common::post_json(
        &state,
        "/api/v1/proposals/generate",
        &json!({ "entityType": "character" }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"]["code"], json!("upstream_error"));
}

#[tokio::test]
async fn test_generate_without_entity_type_returns_400() {
    let state = common::test_state();

    let (status, json) =
        common::post_json(&state, "/api/v1/proposals/generate", &json!({})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], json!("validation_error"));
}
