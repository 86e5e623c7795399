//! Domain models with validation at construction
//!
//! Invalid input returns ValidationError, not panic.

pub mod validation;
pub mod table;
pub mod history;

pub use validation::ValidationError;
pub use table::TableName;
pub use history::{HistoryParams, HistoryQuery, DEFAULT_LOOKBACK_DAYS};

/// One row of the position table, keyed by column name in projection order.
pub type PositionRecord = serde_json::Map<String, serde_json::Value>;
