//! HTTP gateway.
//!
//! Exposes the HTML form, the form submission endpoint, the JSON
//! integration endpoint, and a health check. Every pipeline run is handled
//! in-process by the shared [`Orchestrator`].

pub mod handlers;
pub mod render;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::core::Orchestrator;

/// Shared state accessible by all handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }

    /// Language used when a submission does not name one
    pub fn default_language(&self) -> &str {
        &self.orchestrator.settings().default_language
    }
}

/// Build the router with all routes
pub fn build_router(state: AppState) -> Router {
    handlers::routes()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the gateway on an already-bound listener until the task is dropped
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    let local = listener
        .local_addr()
        .context("Failed to read listener address")?;
    info!(address = %local, "Gateway listening");

    axum::serve(listener, build_router(state))
        .await
        .context("HTTP server terminated")
}

/// Bind `address` and serve the gateway
pub async fn bind_and_serve(address: &str, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    serve(listener, state).await
}
