//! vesseltrack-server: read-only HTTP API over an AIS position table
//!
//! Two endpoints, `/live` (latest position per vessel) and `/historical`
//! (one vessel's track in a date range), each running a single
//! parameterized query and returning the rows as JSON records.

pub mod config;
pub mod db;
pub mod http;
pub mod models;

pub use config::{AuthMode, DbConfig};
pub use db::{PgPositionStore, PositionStore, StoreError};
pub use http::{build_router, run_server, ServerConfig};
