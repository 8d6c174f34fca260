//! Small shared helpers.

use chrono::{DateTime, Datelike, TimeZone, Utc};

/// Truncates a timestamp down to UTC midnight of the same calendar day.
pub fn utc_midnight(at: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(at.year(), at.month(), at.day(), 0, 0, 0)
        .single()
        .unwrap_or(at)
}
