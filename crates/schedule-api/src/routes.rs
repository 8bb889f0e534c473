//! Route definitions
//!
//! Defines all HTTP API endpoints.

use axum::{routing::get, Router};

use crate::handlers::{
    create_session, delete_session, get_session, health, list_sessions, update_session,
};
use crate::server::AppState;

/// Create the API router
pub fn routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health))
        // Schedule collection
        .route("/schedule", get(list_sessions).post(create_session))
        // Single session
        .route(
            "/schedule/{id}",
            get(get_session).put(update_session).delete(delete_session),
        )
}
