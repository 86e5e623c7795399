//! Database connection pool management
//!
//! Uses sqlx PgPool with explicit connection limits. The pool is lazy:
//! the server starts even when the database is unreachable and each
//! request reports the failure on its own.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::DbConfig;

/// Create a PostgreSQL connection pool from the descriptor.
///
/// No connection is opened here.
///
/// # Errors
///
/// Returns an error if the descriptor's URL cannot be parsed.
///
/// # Example
///
/// ```ignore
/// let pool = create_pool(&DbConfig::default())?;
/// ```
pub fn create_pool(config: &DbConfig) -> Result<PgPool, sqlx::Error> {
    let options = config.connect_options()?;

    Ok(PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect_lazy_with(options))
}
