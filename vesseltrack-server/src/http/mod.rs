//! HTTP server layer
//!
//! Axum server with:
//! - CORS (permissive by default)
//! - Request tracing
//! - Graceful shutdown
//! - JSON error envelopes

pub mod server;
pub mod error;
pub mod extractors;
pub mod routes;

pub use server::{build_router, run_server, AppState, ServerConfig, ServerError};
pub use error::ApiError;
