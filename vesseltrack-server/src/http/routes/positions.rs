//! Vessel position endpoints
//!
//! GET /live       - latest record per vessel
//! GET /historical - one vessel's records in a date range

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::http::error::ApiError;
use crate::http::extractors::EnvelopeQuery;
use crate::http::server::AppState;
use crate::models::{HistoryParams, PositionRecord};

/// Success envelope
#[derive(Debug, Serialize)]
pub struct DataEnvelope {
    pub data: Vec<PositionRecord>,
}

/// GET /live
async fn live(State(state): State<Arc<AppState>>) -> Result<Json<DataEnvelope>, ApiError> {
    let data = state.store.latest_positions().await?;
    tracing::debug!(records = data.len(), "live positions");

    Ok(Json(DataEnvelope { data }))
}

/// GET /historical?mmsi=..&start=YYYY-MM-DD&end=YYYY-MM-DD
///
/// Missing dates default relative to the current UTC date, evaluated per request.
async fn historical(
    State(state): State<Arc<AppState>>,
    EnvelopeQuery(params): EnvelopeQuery<HistoryParams>,
) -> Result<Json<DataEnvelope>, ApiError> {
    let query = params.resolve(Utc::now().date_naive());
    let data = state.store.position_history(&query).await?;
    tracing::debug!(
        mmsi = %query.mmsi,
        start = %query.start,
        end = %query.end,
        records = data.len(),
        "position history"
    );

    Ok(Json(DataEnvelope { data }))
}

/// Position routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/live", get(live))
        .route("/historical", get(historical))
}
