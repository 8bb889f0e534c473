//! HTTP API handlers
//!
//! Request handlers for the `/schedule` resource.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{HeaderMap, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use http::header;
use serde::Deserialize;
use tracing::{debug, warn};

use schedule_core::{DeletePolicy, Session};

use crate::error::{ApiError, Result};
use crate::server::AppState;

// ============================================================================
// Request types
// ============================================================================

/// Create/update request payload
///
/// Missing fields decode as empty strings. `id` is ignored on create and
/// must match the path on update.
#[derive(Debug, Deserialize)]
pub struct SessionPayload {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub date: String,
}

// ============================================================================
// Handler functions
// ============================================================================

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}

/// List all sessions, ordered by id
pub async fn list_sessions(State(state): State<AppState>) -> Json<Vec<Session>> {
    let sessions = state.store.list().await;
    debug!("Listing {} sessions", sessions.len());
    Json(sessions)
}

/// Create a session and point `Location` at it
pub async fn create_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    payload: std::result::Result<Json<SessionPayload>, JsonRejection>,
) -> Result<Response> {
    let Json(payload) = payload?;
    let session = state.store.create(payload.title, payload.date).await;

    let mut response = (StatusCode::CREATED, Json(&session)).into_response();
    match location(&headers, &uri, session.id) {
        Some(url) => {
            response.headers_mut().insert(header::LOCATION, url);
        }
        None => warn!(
            "No Host header or URI authority; omitting Location for session {}",
            session.id
        ),
    }

    Ok(response)
}

/// Get a session by id
pub async fn get_session(
    State(state): State<AppState>,
    id: std::result::Result<Path<u64>, PathRejection>,
) -> Result<Json<Session>> {
    let Path(id) = id?;
    debug!("Session request: {}", id);

    state
        .store
        .get(id)
        .await
        .map(Json)
        .ok_or(ApiError::SessionNotFound(id))
}

/// Replace the title and date of the session named by the path
pub async fn update_session(
    State(state): State<AppState>,
    id: std::result::Result<Path<u64>, PathRejection>,
    payload: std::result::Result<Json<SessionPayload>, JsonRejection>,
) -> Result<Json<Session>> {
    let Path(id) = id?;
    let Json(payload) = payload?;

    if let Some(body_id) = payload.id {
        if body_id != id {
            return Err(ApiError::InvalidRequest(format!(
                "id mismatch: path {} body {}",
                id, body_id
            )));
        }
    }

    state
        .store
        .update(id, payload.title, payload.date)
        .await
        .map(Json)
        .ok_or(ApiError::SessionNotFound(id))
}

/// Delete a session; a missing id is reported per the configured policy
pub async fn delete_session(
    State(state): State<AppState>,
    id: std::result::Result<Path<u64>, PathRejection>,
) -> Result<StatusCode> {
    let Path(id) = id?;
    let removed = state.store.delete(id).await;

    match (removed, state.delete_policy) {
        (false, DeletePolicy::Strict) => Err(ApiError::SessionNotFound(id)),
        _ => Ok(StatusCode::NO_CONTENT),
    }
}

/// Absolute URL of a session
///
/// The host comes from the `Host` header, or from the URI authority for
/// HTTP/2 requests which carry it as `:authority` instead.
fn location(headers: &HeaderMap, uri: &Uri, id: u64) -> Option<HeaderValue> {
    let host = match headers.get(header::HOST) {
        Some(value) => value.to_str().ok()?,
        None => uri.authority()?.as_str(),
    };

    let forwarded_https = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|proto| proto.eq_ignore_ascii_case("https"));
    let scheme = if forwarded_https || uri.scheme_str() == Some("https") {
        "https"
    } else {
        "http"
    };

    HeaderValue::from_str(&format!("{}://{}/schedule/{}", scheme, host, id)).ok()
}
