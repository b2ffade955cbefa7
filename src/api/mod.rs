//! HTTP API: axum router over the reconciliation service.

pub mod error;
pub mod routes;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::monitoring::health::HealthState;
use crate::reconcile::MarketplaceService;

/// Shared state accessible by all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<MarketplaceService>,
    pub health: HealthState,
}

impl AppState {
    pub fn new(service: MarketplaceService, health: HealthState) -> Self {
        Self {
            service: Arc::new(service),
            health,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(routes::health_handler))
        .route("/api/marketplace/nfts", get(routes::nfts_handler))
        .route("/api/marketplace/collections", get(routes::collections_handler))
        .route("/api/marketplace/listings", get(routes::listings_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the API until Ctrl-C.
pub async fn serve(state: AppState, bind: &str, port: u16) -> Result<()> {
    let addr = format!("{bind}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind API server on {addr}"))?;

    info!(addr = %addr, "API server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server error")?;

    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
    }
}
