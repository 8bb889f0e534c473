//! HTTP API Server
//!
//! Builds the application router and runs the axum-based HTTP server.

use axum::{http::HeaderValue, middleware, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
};
use tracing::{error, info, warn};

use schedule_core::{DeletePolicy, ServerConfig, SessionStore};

use crate::middleware::logging::request_logger;
use crate::routes::routes;
use crate::Result;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// The one session store of the process
    pub store: Arc<SessionStore>,
    /// How DELETE reports unknown ids
    pub delete_policy: DeletePolicy,
}

impl AppState {
    /// Create a new application state
    pub fn new(store: Arc<SessionStore>, delete_policy: DeletePolicy) -> Self {
        Self {
            store,
            delete_policy,
        }
    }
}

/// Build the complete application: API routes, static files, logging and CORS
pub fn build_app(state: AppState, config: &ServerConfig) -> Router {
    info!("Serving static files from: {}", config.static_dir);

    Router::new()
        .merge(routes())
        .fallback_service(ServeDir::new(&config.static_dir))
        .layer(middleware::from_fn(request_logger))
        .layer(cors_layer(config.allowed_origins.as_deref()))
        .with_state(state)
}

/// Permissive CORS unless specific origins are configured
fn cors_layer(allowed_origins: Option<&[String]>) -> CorsLayer {
    let Some(origins) = allowed_origins else {
        return CorsLayer::permissive();
    };

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin {}: {}", origin, e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Start the HTTP API server and run until Ctrl+C
pub async fn start_server(config: &ServerConfig, state: AppState) -> Result<()> {
    let addr = config.socket_addr()?;
    let app = build_app(state, config);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("HTTP API listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("HTTP API stopped");
    Ok(())
}

/// Resolves when the process receives Ctrl+C
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutting down..."),
        Err(e) => {
            // Without a signal handler the server runs until killed
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
