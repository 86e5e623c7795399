//! Axum server setup
//!
//! Server skeleton with:
//! - Permissive CORS by default (the map frontend is served from elsewhere)
//! - Tracing middleware
//! - Optional legacy status mode (error envelopes answered with 200)
//! - Graceful shutdown on SIGTERM/Ctrl+C

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderValue, StatusCode};
use axum::middleware::map_response;
use axum::response::Response;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::error::ErrorEnvelope;
use super::routes;
use crate::db::PositionStore;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:8000)
    pub bind_addr: SocketAddr,

    /// Allow any origin, method and header, with credentials (default: true)
    ///
    /// When false, only localhost origins are allowed.
    pub cors_permissive: bool,

    /// Answer error envelopes with 200 OK, for frontends that only
    /// inspect the body (default: false)
    pub legacy_error_status: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            cors_permissive: true,
            legacy_error_status: false,
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PositionStore>,
}

/// Build the application router.
pub fn build_router(store: Arc<dyn PositionStore>, config: &ServerConfig) -> Router {
    let state = AppState { store };

    let cors = if config.cors_permissive {
        // Mirrors the request origin so credentials stay allowed
        CorsLayer::very_permissive()
    } else {
        tracing::warn!("CORS: localhost origins only");
        CorsLayer::new()
            .allow_origin([
                HeaderValue::from_static("http://localhost:3000"),
                HeaderValue::from_static("http://localhost:8000"),
                HeaderValue::from_static("http://127.0.0.1:3000"),
                HeaderValue::from_static("http://127.0.0.1:8000"),
            ])
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let mut app = Router::new()
        .merge(routes::health::router())
        .merge(routes::positions::router())
        .with_state(Arc::new(state));

    if config.legacy_error_status {
        tracing::warn!("Legacy status mode: error envelopes are answered with 200 OK");
        app = app.layer(map_response(legacy_status));
    }

    app.layer(cors).layer(TraceLayer::new_for_http())
}

/// Rewrite store-error statuses to 200; parameter errors keep their 400.
async fn legacy_status(mut response: Response) -> Response {
    let is_store_error = response.extensions().get::<ErrorEnvelope>().is_some()
        && response.status() != StatusCode::BAD_REQUEST;

    if is_store_error {
        *response.status_mut() = StatusCode::OK;
    }
    response
}

/// Run the HTTP server.
///
/// # Example
///
/// ```ignore
/// let pool = create_pool(&db_config)?;
/// let store = Arc::new(PgPositionStore::new(pool, &db_config.table, db_config.query_timeout));
/// run_server(store, ServerConfig::default()).await?;
/// ```
pub async fn run_server(store: Arc<dyn PositionStore>, config: ServerConfig) -> Result<(), ServerError> {
    let app = build_router(store, &config);

    // Bind listener
    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    // Run with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
