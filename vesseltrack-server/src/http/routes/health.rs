//! Liveness of the position API process
//!
//! `ok` means the server is accepting requests. The database is not
//! contacted, so a down database still reports `ok`; `/live` and
//! `/historical` answer 503 in that case.

use axum::{routing::get, Json, Router};
use serde::Serialize;

/// Health check response: fixed status plus the running server version
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Health routes
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(health))
}
