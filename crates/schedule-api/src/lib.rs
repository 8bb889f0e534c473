//! schedule-api: HTTP API for the schedule service
//!
//! Exposes the session store as a small REST resource under `/schedule`
//! and serves static files for every other path.
//! Built with axum for async HTTP handling.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;

pub use error::{ApiError, Result};
pub use server::{build_app, start_server, AppState};
