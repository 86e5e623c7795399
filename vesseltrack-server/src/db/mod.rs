//! Database layer - connection pool, SQL, row encoding, store
//!
//! # Design Principles
//!
//! - One pooled connection per request, released on every path
//! - Ranking and range filtering happen in SQL, never in the application
//! - Request values are bound parameters; only the configured table name is
//!   spliced into SQL text

pub mod pool;
pub mod queries;
pub mod encode;
pub mod store;

pub use pool::create_pool;
pub use store::{PgPositionStore, PositionStore, StoreError};
