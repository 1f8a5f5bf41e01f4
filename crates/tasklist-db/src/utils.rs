//! Shared utility functions

use chrono::{DateTime, Utc};

/// Parse a stored RFC3339 timestamp, falling back to the current time
/// when the column holds something unparseable.
pub fn parse_datetime_or_now(s: &str) -> DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
