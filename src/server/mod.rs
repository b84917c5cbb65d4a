//! HTTP surface: one JSON request and one JSON response per action.

pub mod error;
pub mod routes;

use anyhow::{Context, Result};
use axum::Router;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::catalog::RecipeCatalog;
pub use error::AppError;

/// Shared handler state. `catalog` is `None` when the recipe store could not
/// be opened; every endpoint that needs it then answers with
/// "Database not initialized".
#[derive(Clone, Default)]
pub struct AppState {
    catalog: Option<RecipeCatalog>,
}

impl AppState {
    pub fn new(catalog: RecipeCatalog) -> Self {
        AppState {
            catalog: Some(catalog),
        }
    }

    pub fn uninitialized() -> Self {
        AppState { catalog: None }
    }

    pub fn catalog(&self) -> Result<&RecipeCatalog, AppError> {
        self.catalog.as_ref().ok_or(AppError::DatabaseNotInitialized)
    }
}

/// Routes are served both at the root and under `/api`.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::api_routes())
        .nest("/api", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("API server running on http://{}", addr);
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Shutting down...");
}
