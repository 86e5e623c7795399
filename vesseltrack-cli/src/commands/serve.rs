//! HTTP server command for the vessel position API
//!
//! Builds the database descriptor from flags, environment and `.env`,
//! then runs the server until Ctrl+C / SIGTERM.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use vesseltrack_server::db::{create_pool, PgPositionStore};
use vesseltrack_server::http::{run_server, ServerConfig};
use vesseltrack_server::models::TableName;
use vesseltrack_server::{AuthMode, DbConfig};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to
    #[arg(long, short = 'b', env = "VESSELTRACK_BIND", default_value = "127.0.0.1:8000")]
    pub bind: SocketAddr,

    /// Restrict CORS to localhost origins (default: any origin, with credentials)
    #[arg(long)]
    pub cors_localhost_only: bool,

    /// Answer error envelopes with 200 OK, for frontends that only read the body
    #[arg(long, env = "VESSELTRACK_LEGACY_ERROR_STATUS")]
    pub legacy_error_status: bool,

    /// Database server host
    #[arg(long, env = "VESSELTRACK_DB_HOST", default_value = "localhost")]
    pub db_host: String,

    /// Database server port
    #[arg(long, env = "VESSELTRACK_DB_PORT", default_value_t = 5432)]
    pub db_port: u16,

    /// Database name
    #[arg(long, env = "VESSELTRACK_DB_NAME", default_value = "ais")]
    pub db_name: String,

    /// Database role (default: PGUSER, then the OS user)
    #[arg(long, env = "VESSELTRACK_DB_USER")]
    pub db_user: Option<String>,

    /// Database password; omit for trusted authentication
    #[arg(long, env = "VESSELTRACK_DB_PASSWORD", hide_env_values = true)]
    pub db_password: Option<String>,

    /// Full database URL (overrides host/port/name/user/password)
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Position table, optionally schema-qualified
    #[arg(long, env = "VESSELTRACK_TABLE", default_value = "spire.vessel")]
    pub table: TableName,

    /// Maximum pooled connections
    #[arg(long, env = "VESSELTRACK_MAX_CONNECTIONS", default_value_t = 5)]
    pub max_connections: u32,

    /// Seconds to wait for a database connection
    #[arg(long, env = "VESSELTRACK_ACQUIRE_TIMEOUT_SECS", default_value_t = 30)]
    pub acquire_timeout_secs: u64,

    /// Query timeout in seconds (default: no timeout)
    #[arg(long, env = "VESSELTRACK_QUERY_TIMEOUT_SECS")]
    pub query_timeout_secs: Option<u64>,
}

impl ServeArgs {
    pub fn db_config(&self) -> DbConfig {
        let auth = match &self.db_password {
            Some(password) => AuthMode::Password(password.clone()),
            None => AuthMode::Trusted,
        };

        DbConfig {
            host: self.db_host.clone(),
            port: self.db_port,
            database: self.db_name.clone(),
            username: self.db_user.clone(),
            auth,
            url: self.database_url.clone(),
            table: self.table.clone(),
            max_connections: self.max_connections,
            acquire_timeout: Duration::from_secs(self.acquire_timeout_secs),
            query_timeout: self.query_timeout_secs.map(Duration::from_secs),
        }
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            bind_addr: self.bind,
            cors_permissive: !self.cors_localhost_only,
            legacy_error_status: self.legacy_error_status,
        }
    }
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let db_config = args.db_config();
    let server_config = args.server_config();

    match db_config.query_timeout {
        Some(limit) => tracing::info!(seconds = limit.as_secs(), "Query timeout configured"),
        None => tracing::info!("No query timeout configured; queries may run indefinitely"),
    }
    tracing::info!(target_db = %db_config.describe(), "Starting vesseltrack server on {}", args.bind);

    // Lazy pool: nothing connects until the first request
    let pool = create_pool(&db_config).context("Invalid database configuration")?;
    let store = PgPositionStore::new(pool, &db_config.table, db_config.query_timeout);

    // Run server (blocks until shutdown)
    run_server(Arc::new(store), server_config)
        .await
        .context("Server error")?;

    Ok(())
}
