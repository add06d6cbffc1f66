//! Timestamps for registry builds and resolutions.
//!
//! Stored as Unix epoch microseconds (u64); rendered as RFC 3339 for audit.

use chrono::{DateTime, Utc};

/// Current wall-clock time in microseconds since the Unix epoch.
pub fn now_micros() -> u64 {
    Utc::now().timestamp_micros().max(0) as u64
}

/// Render epoch microseconds as an RFC 3339 UTC string.
pub fn micros_to_rfc3339(micros: u64) -> String {
    let micros = i64::try_from(micros).unwrap_or(i64::MAX);
    DateTime::<Utc>::from_timestamp_micros(micros)
        .unwrap_or(DateTime::UNIX_EPOCH)
        .to_rfc3339()
}
