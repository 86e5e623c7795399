//! Historical query parameters
//!
//! Date defaults are resolved against the caller-supplied "today" so the
//! handler can evaluate them per request and tests can pin them.

use chrono::{Days, NaiveDate};
use serde::Deserialize;

/// Days between the default start date and today.
pub const DEFAULT_LOOKBACK_DAYS: u64 = 3;

/// Raw `/historical` query string
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryParams {
    /// Vessel identifier (required)
    pub mmsi: String,
    /// Inclusive lower bound, `YYYY-MM-DD`
    pub start: Option<NaiveDate>,
    /// Inclusive upper bound, `YYYY-MM-DD`
    pub end: Option<NaiveDate>,
}

/// Fully resolved history query, ready to bind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub mmsi: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl HistoryParams {
    /// Fill in missing bounds: `start = today - 3 days`, `end = today`.
    pub fn resolve(self, today: NaiveDate) -> HistoryQuery {
        let start = self.start.unwrap_or_else(|| default_start(today));
        let end = self.end.unwrap_or(today);

        HistoryQuery {
            mmsi: self.mmsi,
            start,
            end,
        }
    }
}

fn default_start(today: NaiveDate) -> NaiveDate {
    today
        .checked_sub_days(Days::new(DEFAULT_LOOKBACK_DAYS))
        .unwrap_or(NaiveDate::MIN)
}
