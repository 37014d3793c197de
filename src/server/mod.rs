//! HTTP ingress
//!
//! axum server exposing the pipeline:
//! - `POST /qa` with `{"question": ...}` returns `{"answer", "context"}`
//! - `GET /health` returns `{"status": "ok"}`

pub mod error;
pub mod handlers;

use crate::agent::QaPipeline;
use crate::errors::{QaError, Result};
use axum::Router;
use std::sync::Arc;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub use error::{ApiError, ApiResult};
pub use handlers::{create_router, AppState, HealthResponse, QaRequest};

/// Router with state, CORS and request tracing applied
pub fn build_app(pipeline: Arc<QaPipeline>) -> Router {
    create_router()
        .with_state(AppState::new(pipeline))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Serve until Ctrl+C (or SIGTERM on unix)
pub async fn serve(pipeline: Arc<QaPipeline>, addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        error!("Failed to bind to {}: {:?}", addr, e);
        QaError::ConfigError(format!("Failed to bind to {}: {}", addr, e))
    })?;

    info!("Server listening on: http://{}", addr);

    axum::serve(listener, build_app(pipeline))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received shutdown signal");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix;
        match unix::signal(unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
                info!("Received TERM signal");
            }
            Err(e) => {
                error!("Failed to install TERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
