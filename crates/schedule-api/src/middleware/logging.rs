//! Request logging middleware
//!
//! Logs one line per request: remote address, method, URI, status and latency.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, Request},
    middleware::Next,
    response::Response,
};
use tracing::info;

/// Request logging middleware
pub async fn request_logger(request: Request, next: Next) -> Response {
    // Only present when served with connect info
    let remote = remote_addr(&request);
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    info!(
        "{} {} {} -> {} ({:?})",
        remote,
        method,
        uri,
        response.status().as_u16(),
        start.elapsed()
    );

    response
}

/// Peer address of the connection, or "-" when unknown
fn remote_addr(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string())
}
