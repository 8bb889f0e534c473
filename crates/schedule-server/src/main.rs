//! schedule-server: Schedule Service Main Binary
//!
//! Usage:
//!   schedule-server                 - Start the HTTP server
//!   schedule-server --config PATH   - Start with an explicit config file
//!   schedule-server --help          - Show help

use std::sync::Arc;

use schedule_api::AppState;
use schedule_core::{Config, SessionStore};
use tracing_subscriber::EnvFilter;

/// Run mode
#[derive(Debug, PartialEq, Eq)]
enum RunMode {
    /// Serve HTTP, optionally with an explicit config file
    Server { config_path: Option<String> },
    /// Show help
    Help,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mode = parse_args(std::env::args().skip(1))?;

    let config_path = match mode {
        RunMode::Help => {
            print_help();
            return Ok(());
        }
        RunMode::Version => {
            println!("schedule-server {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        RunMode::Server { config_path } => config_path,
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load .env file
    dotenvy::dotenv().ok();

    let config = match &config_path {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path);
            Config::from_toml_file(path)
        }
        None => Config::load(),
    }
    .map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    tracing::info!("Starting schedule-server...");
    tracing::info!("Delete policy: {:?}", config.store.delete_policy);

    let store = if config.store.seed_samples {
        SessionStore::with_samples().await
    } else {
        SessionStore::new()
    };
    tracing::info!("Session store ready with {} sessions", store.len().await);

    let state = AppState::new(Arc::new(store), config.store.delete_policy);

    schedule_api::start_server(&config.server, state)
        .await
        .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Parse command line arguments
fn parse_args(args: impl IntoIterator<Item = String>) -> anyhow::Result<RunMode> {
    let mut args = args.into_iter();
    let mut config_path = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(RunMode::Help),
            "--version" | "-v" => return Ok(RunMode::Version),
            "--config" | "-c" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("{} requires a path", arg))?;
                config_path = Some(path);
            }
            other => anyhow::bail!("Unknown argument: {} (see --help)", other),
        }
    }

    Ok(RunMode::Server { config_path })
}

/// Print help message
fn print_help() {
    println!("schedule-server - in-memory schedule HTTP service");
    println!();
    println!("Usage:");
    println!("  schedule-server                Start the HTTP server");
    println!("  schedule-server --config PATH  Use PATH instead of ./schedule.toml");
    println!("  schedule-server --help         Show this help message");
    println!("  schedule-server --version      Show version");
    println!();
    println!("Environment Variables:");
    println!("  SERVER_HOST          Interface to bind (default: 0.0.0.0)");
    println!("  SERVER_PORT          HTTP port (default: 8080)");
    println!("  STATIC_DIR           Static file directory (default: www)");
    println!("  ALLOWED_ORIGINS      Comma-separated CORS origins (default: any)");
    println!("  SEED_SAMPLES         Seed sample sessions (default: true)");
    println!("  DELETE_POLICY        idempotent or strict (default: idempotent)");
    println!("  RUST_LOG             Log filter (default: info)");
}
