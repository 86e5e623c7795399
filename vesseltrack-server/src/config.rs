//! Database connection descriptor
//!
//! Injected at startup (see `vesseltrack serve`), never a module-level
//! constant, so tests and deployments can point at any PostgreSQL.

use std::fmt;
use std::time::Duration;

use sqlx::postgres::PgConnectOptions;

use crate::models::TableName;

/// Default maximum connections for the pool.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Default time to wait for a free or new connection.
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// How the service authenticates to the database
#[derive(Clone, PartialEq, Eq)]
pub enum AuthMode {
    /// No credential is sent; the server trusts the peer (trust/peer/ident/gss).
    Trusted,
    /// Password authentication.
    Password(String),
}

impl fmt::Debug for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trusted => f.write_str("Trusted"),
            Self::Password(_) => f.write_str("Password(<redacted>)"),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Server host name or socket directory
    pub host: String,
    pub port: u16,
    /// Database name
    pub database: String,
    /// Role to connect as. `None` uses the libpq default (`PGUSER`, then the OS user).
    pub username: Option<String>,
    pub auth: AuthMode,
    /// Full connection URL; when set it replaces host/port/database/username/auth
    pub url: Option<String>,
    /// Table holding position observations
    pub table: TableName,
    pub max_connections: u32,
    /// Upper bound on waiting for a connection from the pool
    pub acquire_timeout: Duration,
    /// Upper bound on a single query. `None` (the default) means queries
    /// may run indefinitely.
    pub query_timeout: Option<Duration>,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            database: "ais".to_string(),
            username: None,
            auth: AuthMode::Trusted,
            url: None,
            table: TableName::default(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
            query_timeout: None,
        }
    }
}

impl DbConfig {
    /// Build sqlx connect options from the descriptor.
    ///
    /// Trusted mode skips `.pgpass` lookup so no credential goes over the wire.
    ///
    /// # Errors
    ///
    /// Returns an error if `url` is set and cannot be parsed.
    pub fn connect_options(&self) -> Result<PgConnectOptions, sqlx::Error> {
        if let Some(url) = &self.url {
            return url.parse::<PgConnectOptions>();
        }

        let mut options = match &self.auth {
            AuthMode::Trusted => PgConnectOptions::new_without_pgpass(),
            AuthMode::Password(password) => PgConnectOptions::new_without_pgpass().password(password),
        };

        options = options
            .host(&self.host)
            .port(self.port)
            .database(&self.database);

        if let Some(username) = &self.username {
            options = options.username(username);
        }

        Ok(options)
    }

    /// Human-readable target for logs, never including credentials.
    pub fn describe(&self) -> String {
        match &self.url {
            Some(_) => format!("database_url (table {})", self.table),
            None => format!(
                "{}:{}/{} (table {}, auth {:?})",
                self.host, self.port, self.database, self.table, self.auth
            ),
        }
    }
}
