//! API routes

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub mod health;
pub mod webhooks;

/// Build the router; `/webhook` answers 405 to anything but POST
pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_body_bytes;

    Router::new()
        .route("/health", get(health::health))
        .route(
            "/webhook",
            post(webhooks::receive).fallback(webhooks::method_not_allowed),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
