//! Position store - the query layer behind both endpoints
//!
//! `PositionStore` is the seam the HTTP layer talks to; `PgPositionStore`
//! is the PostgreSQL implementation. Each call acquires its own pooled
//! connection and gives it back on every exit path (the connection is
//! an RAII guard, so errors and timeouts release it too).

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::{PgPool, Postgres};

use super::encode::encode_row;
use super::queries::{history_sql, live_sql, LIVE_RANK_COLUMN};
use crate::models::{HistoryQuery, PositionRecord, TableName};

/// Store error type
///
/// Closed taxonomy; every variant renders the same `{"error": ...}` body
/// but maps to its own HTTP status.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Could not obtain a working connection
    #[error("connection error: {0}")]
    Connection(String),

    /// The statement failed
    #[error("query error: {0}")]
    Query(String),

    /// The configured query timeout elapsed
    #[error("query timed out after {limit:?}")]
    Timeout { limit: Duration },
}

impl StoreError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connection(_) => "connection",
            Self::Query(_) => "query",
            Self::Timeout { .. } => "timeout",
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        use sqlx::Error as E;

        match e {
            E::Configuration(_)
            | E::Io(_)
            | E::Tls(_)
            | E::PoolTimedOut
            | E::PoolClosed
            | E::WorkerCrashed => Self::Connection(e.to_string()),
            _ => Self::Query(e.to_string()),
        }
    }
}

/// Read-only access to vessel positions
#[async_trait]
pub trait PositionStore: Send + Sync + 'static {
    /// Latest record per vessel across the whole table.
    async fn latest_positions(&self) -> Result<Vec<PositionRecord>, StoreError>;

    /// One vessel's records within `[start, end]`, ascending by timestamp.
    async fn position_history(&self, query: &HistoryQuery) -> Result<Vec<PositionRecord>, StoreError>;
}

/// PostgreSQL position store
#[derive(Clone)]
pub struct PgPositionStore {
    pool: PgPool,
    live_sql: String,
    history_sql: String,
    query_timeout: Option<Duration>,
}

impl PgPositionStore {
    pub fn new(pool: PgPool, table: &TableName, query_timeout: Option<Duration>) -> Self {
        Self {
            pool,
            live_sql: live_sql(table),
            history_sql: history_sql(table),
            query_timeout,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Failures here (refused, DNS, TLS, authentication, pool timeout)
    /// are all connection errors.
    async fn acquire(&self) -> Result<PoolConnection<Postgres>, StoreError> {
        self.pool
            .acquire()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))
    }

    /// Bounds statement execution only; acquiring is bounded by the
    /// pool's acquire timeout and reported as a connection error.
    async fn with_timeout<T, F>(&self, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match self.query_timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| StoreError::Timeout { limit })?,
            None => fut.await,
        }
    }
}

#[async_trait]
impl PositionStore for PgPositionStore {
    async fn latest_positions(&self) -> Result<Vec<PositionRecord>, StoreError> {
        let mut conn = self.acquire().await?;

        self.with_timeout(async {
            let rows = sqlx::query(&self.live_sql).fetch_all(&mut *conn).await?;

            Ok(rows
                .iter()
                .map(|row| encode_row(row, &[LIVE_RANK_COLUMN]))
                .collect())
        })
        .await
    }

    async fn position_history(&self, query: &HistoryQuery) -> Result<Vec<PositionRecord>, StoreError> {
        let mut conn = self.acquire().await?;

        self.with_timeout(async {
            let rows = sqlx::query(&self.history_sql)
                .bind(&query.mmsi)
                .bind(query.start)
                .bind(query.end)
                .fetch_all(&mut *conn)
                .await?;

            Ok(rows.iter().map(|row| encode_row(row, &[])).collect())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DbConfig;
    use crate::db::create_pool;
    use chrono::NaiveDate;

    #[test]
    fn pool_failures_are_connection_errors() {
        assert!(matches!(StoreError::from(sqlx::Error::PoolTimedOut), StoreError::Connection(_)));
        assert!(matches!(StoreError::from(sqlx::Error::PoolClosed), StoreError::Connection(_)));
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        assert!(matches!(StoreError::from(sqlx::Error::Io(io)), StoreError::Connection(_)));
    }

    #[test]
    fn statement_failures_are_query_errors() {
        assert!(matches!(StoreError::from(sqlx::Error::RowNotFound), StoreError::Query(_)));
        let decode = sqlx::Error::ColumnNotFound("mmsi".into());
        assert!(matches!(StoreError::from(decode), StoreError::Query(_)));
    }

    #[test]
    fn kinds() {
        assert_eq!(StoreError::Connection("x".into()).kind(), "connection");
        assert_eq!(StoreError::Query("x".into()).kind(), "query");
        assert_eq!(StoreError::Timeout { limit: Duration::from_secs(5) }.kind(), "timeout");
    }

    fn unreachable_store() -> PgPositionStore {
        let config = DbConfig {
            host: "127.0.0.1".into(),
            port: 1,
            acquire_timeout: Duration::from_millis(200),
            ..DbConfig::default()
        };
        let pool = create_pool(&config).expect("pool creation failed");
        PgPositionStore::new(pool, &config.table, None)
    }

    #[tokio::test]
    async fn unreachable_database_is_connection_error_and_holds_nothing() {
        let store = unreachable_store();
        let query = HistoryQuery {
            mmsi: "1".into(),
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        };

        for _ in 0..5 {
            let err = store.latest_positions().await.unwrap_err();
            assert!(matches!(err, StoreError::Connection(_)), "{err}");
            let err = store.position_history(&query).await.unwrap_err();
            assert!(matches!(err, StoreError::Connection(_)), "{err}");
        }
        assert_eq!(store.pool().size(), 0);
    }

    #[tokio::test]
    async fn timeout_wraps_slow_work() {
        let store = PgPositionStore {
            query_timeout: Some(Duration::from_millis(10)),
            ..unreachable_store()
        };
        let err = store
            .with_timeout(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, StoreError>(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Timeout { limit } if limit == Duration::from_millis(10)));
        assert_eq!(err.to_string(), "query timed out after 10ms");
    }

    #[tokio::test]
    async fn unreachable_database_with_short_query_timeout_is_still_connection_error() {
        let config = DbConfig {
            host: "127.0.0.1".into(),
            port: 1,
            acquire_timeout: Duration::from_secs(3),
            ..DbConfig::default()
        };
        let pool = create_pool(&config).expect("pool creation failed");
        let store = PgPositionStore::new(pool, &config.table, Some(Duration::from_millis(500)));

        let err = store.latest_positions().await.unwrap_err();
        assert!(matches!(err, StoreError::Connection(_)), "{err}");
        assert_eq!(err.kind(), "connection");
    }

    // Run with: DATABASE_URL=postgres://... cargo test -p vesseltrack-server -- --ignored
    #[tokio::test]
    #[ignore = "requires database"]
    async fn live_and_history_against_fixture_table() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let config = DbConfig {
            url: Some(url),
            table: TableName::new("vt_test_vessel").unwrap(),
            ..DbConfig::default()
        };
        let pool = create_pool(&config).expect("pool creation failed");

        sqlx::query("DROP TABLE IF EXISTS vt_test_vessel").execute(&pool).await.unwrap();
        sqlx::query(
            r#"CREATE TABLE vt_test_vessel (
                mmsi BIGINT NOT NULL,
                "timestamp" TIMESTAMP NOT NULL,
                latitude DOUBLE PRECISION,
                longitude DOUBLE PRECISION,
                name TEXT
            )"#,
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            r#"INSERT INTO vt_test_vessel VALUES
                (1, '2024-01-01 00:00:00', 10.0, 20.0, 'A'),
                (1, '2024-01-02 00:00:00', 11.0, 21.0, 'A'),
                (1, '2024-01-05 00:00:00', 12.0, 22.0, 'A'),
                (2, '2024-01-03 00:00:00', 30.0, 40.0, NULL)"#,
        )
        .execute(&pool)
        .await
        .unwrap();

        let store = PgPositionStore::new(pool.clone(), &config.table, None);

        let mut live = store.latest_positions().await.unwrap();
        live.sort_by_key(|r| r["mmsi"].as_i64());
        assert_eq!(live.len(), 2);
        assert_eq!(live[0]["timestamp"], "2024-01-05T00:00:00");
        assert_eq!(live[1]["name"], serde_json::Value::Null);
        assert!(!live[0].contains_key(LIVE_RANK_COLUMN));
        let columns: Vec<_> = live[0].keys().cloned().collect();
        assert_eq!(columns, ["mmsi", "timestamp", "latitude", "longitude", "name"]);

        let history = store
            .position_history(&HistoryQuery {
                mmsi: "1".into(),
                start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                end: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            })
            .await
            .unwrap();
        let stamps: Vec<_> = history.iter().map(|r| r["timestamp"].clone()).collect();
        assert_eq!(stamps, ["2024-01-01T00:00:00", "2024-01-02T00:00:00"]);

        let injected = store
            .position_history(&HistoryQuery {
                mmsi: "1; DROP TABLE vt_test_vessel;".into(),
                start: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
                end: NaiveDate::from_ymd_opt(2100, 1, 1).unwrap(),
            })
            .await
            .unwrap();
        assert!(injected.is_empty());
        assert_eq!(store.latest_positions().await.unwrap().len(), 2);

        sqlx::query("DROP TABLE vt_test_vessel").execute(&pool).await.unwrap();
    }
}
