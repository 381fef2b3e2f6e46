//! Router configuration for the Campaign Dialer API

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::AppState;

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready))
        // Call dispatch
        .route("/calls", post(handlers::create_calls))
        // Provider webhooks
        .route("/webhooks/calls", post(handlers::call_webhook))
        .route("/webhooks/calls", get(handlers::call_webhook_verify))
        .with_state(state)
}
