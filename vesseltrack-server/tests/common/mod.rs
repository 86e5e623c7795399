// Common test utilities: in-memory substitute stores and request helpers

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::NaiveDateTime;
use serde_json::{json, Value};
use tower::ServiceExt;

use vesseltrack_server::models::{HistoryQuery, PositionRecord};
use vesseltrack_server::{build_router, PositionStore, ServerConfig, StoreError};

/// Build a position record from a JSON object literal
#[allow(dead_code)]
pub fn record(value: Value) -> PositionRecord {
    match value {
        Value::Object(map) => map,
        other => panic!("record must be a JSON object, got {other}"),
    }
}

/// Four observations of two vessels
#[allow(dead_code)]
pub fn fixture_rows() -> Vec<PositionRecord> {
    vec![
        record(json!({"mmsi": 366999712, "timestamp": "2024-03-01T06:00:00", "latitude": 37.70, "longitude": -122.40})),
        record(json!({"mmsi": 366999712, "timestamp": "2024-03-03T06:00:00", "latitude": 37.80, "longitude": -122.50})),
        record(json!({"mmsi": 366999712, "timestamp": "2024-03-02T06:00:00", "latitude": 37.75, "longitude": -122.45})),
        record(json!({"mmsi": 538005989, "timestamp": "2024-03-02T12:00:00", "latitude": 47.60, "longitude": -122.30})),
    ]
}

fn timestamp(record: &PositionRecord) -> NaiveDateTime {
    let text = record["timestamp"].as_str().expect("timestamp must be a string");
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f").expect("bad fixture timestamp")
}

fn mmsi_text(record: &PositionRecord) -> String {
    match &record["mmsi"] {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// In-memory store with the same answers the SQL gives
#[derive(Default)]
pub struct MemoryStore {
    rows: Vec<PositionRecord>,
    pub calls: AtomicUsize,
    pub last_query: Mutex<Option<HistoryQuery>>,
}

#[allow(dead_code)]
impl MemoryStore {
    pub fn new(rows: Vec<PositionRecord>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> Option<HistoryQuery> {
        self.last_query.lock().unwrap().clone()
    }
}

#[async_trait]
impl PositionStore for MemoryStore {
    async fn latest_positions(&self) -> Result<Vec<PositionRecord>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let mut latest: Vec<PositionRecord> = Vec::new();
        for row in &self.rows {
            match latest.iter_mut().find(|r| mmsi_text(r) == mmsi_text(row)) {
                Some(existing) if timestamp(existing) < timestamp(row) => *existing = row.clone(),
                Some(_) => {}
                None => latest.push(row.clone()),
            }
        }
        Ok(latest)
    }

    async fn position_history(&self, query: &HistoryQuery) -> Result<Vec<PositionRecord>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_query.lock().unwrap() = Some(query.clone());

        // BETWEEN on dates compares against midnight of each bound
        let start = query.start.and_hms_opt(0, 0, 0).unwrap();
        let end = query.end.and_hms_opt(0, 0, 0).unwrap();

        let mut rows: Vec<PositionRecord> = self
            .rows
            .iter()
            .filter(|r| mmsi_text(r) == query.mmsi)
            .filter(|r| (start..=end).contains(&timestamp(r)))
            .cloned()
            .collect();
        rows.sort_by_key(timestamp);
        Ok(rows)
    }
}

/// Store whose every call "opens" a connection and then fails
#[derive(Default)]
pub struct FailingStore {
    pub open: AtomicUsize,
    pub peak: AtomicUsize,
    pub attempts: AtomicUsize,
}

struct ConnectionGuard<'a>(&'a AtomicUsize);

impl Drop for ConnectionGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl FailingStore {
    /// Opens a "socket" whose handshake then fails; the guard is dropped
    /// on the error return.
    fn fail_after_open(&self) -> Result<Vec<PositionRecord>, StoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let now_open = self.open.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now_open, Ordering::SeqCst);
        let _conn = ConnectionGuard(&self.open);

        Err(StoreError::Connection(
            "could not connect to server: Connection refused".into(),
        ))
    }
}

#[async_trait]
impl PositionStore for FailingStore {
    async fn latest_positions(&self) -> Result<Vec<PositionRecord>, StoreError> {
        self.fail_after_open()
    }

    async fn position_history(&self, _query: &HistoryQuery) -> Result<Vec<PositionRecord>, StoreError> {
        self.fail_after_open()
    }
}

/// Router over a store with default server settings
#[allow(dead_code)]
pub fn app(store: Arc<dyn PositionStore>) -> Router {
    build_router(store, &ServerConfig::default())
}

/// Issue a GET and decode the JSON body
#[allow(dead_code)]
pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}
