//! API error types with IntoResponse
//!
//! Every failure renders the same `{"error": "<message>"}` envelope; the
//! status code carries the error kind.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::db::StoreError;

/// Marker extension set on every error envelope response.
///
/// Lets the legacy-status layer find error envelopes without parsing bodies.
#[derive(Debug, Clone, Copy)]
pub struct ErrorEnvelope;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Query string could not be bound (400)
    BadRequest { message: String },

    /// Store failure: connection (503), query (500), timeout (504)
    Store(StoreError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Store(StoreError::Connection(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Store(StoreError::Query(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Store(StoreError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            Self::BadRequest { message } => {
                tracing::debug!(%message, "rejected request parameters");
                message
            }
            Self::Store(e) => {
                tracing::error!(kind = e.kind(), error = %e, "store error");
                e.to_string()
            }
        };

        let mut response = (status, Json(json!({ "error": message }))).into_response();
        response.extensions_mut().insert(ErrorEnvelope);
        response
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}
