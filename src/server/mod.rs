//! Web UI Server
//!
//! One page, one button: an axum router serving the static page and
//! the ask endpoint. All per-request state is rebuilt on each
//! interaction; the shared state holds only the configuration and the
//! long-lived HTTP clients.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::inference::GroqClient;
use crate::types::{AppConfig, ToolContext};

pub mod error;
pub mod routes;

pub struct AppState {
    pub config: AppConfig,
    pub inference: GroqClient,
    pub tools: ToolContext,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let inference = GroqClient::new(&config);
        Self {
            config,
            inference,
            tools: ToolContext::new(),
        }
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(routes::index))
        .route("/health", get(routes::health))
        .route("/api/ask", post(routes::ask))
        .with_state(state)
        .layer(cors)
}

/// Bind and serve until ctrl-c. A failed interaction never takes the
/// process down; only the shutdown signal does.
pub async fn serve(config: AppConfig) -> Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(AppState::new(config));
    let app = build_router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("NIMBUS AI listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down");
    Ok(())
}

async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
}
