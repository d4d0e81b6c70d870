//! HTTP route trees.

use axum::Router;

use crate::state::SharedState;

/// Caller identity extraction.
pub mod auth;
/// Swagger UI and OpenAPI document routes.
pub mod docs;
/// Health check routes.
pub mod health;
/// Match lifecycle and roster routes.
pub mod matches;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router().merge(matches::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
