//! Route modules and the assembled API router.

pub mod health;
pub mod proposals;
pub mod templates;

use axum::Router;

use crate::state::AppState;

/// Assembles the full route tree. `main` and the integration tests share
/// this so they exercise the same paths.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/api/v1/proposals", proposals::router())
        .nest("/api/v1/templates", templates::router())
}
