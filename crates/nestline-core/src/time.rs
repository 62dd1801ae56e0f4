//! Clock helpers.

use chrono::{DateTime, Utc};

/// Returns the current UTC time truncated to microsecond precision.
///
/// Timestamps are persisted in `DATETIME(6)` columns and embedded in cursor
/// tokens at microsecond resolution. Truncating at the source keeps an
/// in-memory entity identical to its stored form, so keyset comparisons
/// against a decoded cursor position behave the same on both sides.
#[must_use]
pub fn now() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_micros(now.timestamp_micros()).unwrap_or(now)
}
