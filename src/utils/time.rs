//! Timestamp normalization and past-event checks
//!
//! Dates arrive from the backing store in more than one wire shape: plain
//! RFC3339 strings, epoch milliseconds, or a wrapped `{seconds, nanoseconds}`
//! object produced by server-assigned timestamps. Everything is normalized to
//! a canonical `DateTime<Utc>` here, at the data-model boundary, so no other
//! module branches on representation.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

/// Normalize any accepted wire representation of an instant.
///
/// Returns `None` for null, missing, or unrecognized values.
pub fn normalize_instant(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => {
            let millis = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            Utc.timestamp_millis_opt(millis).single()
        }
        Value::Object(map) => {
            let seconds = map.get("seconds").and_then(Value::as_i64)?;
            let nanos = map
                .get("nanoseconds")
                .and_then(Value::as_i64)
                .unwrap_or(0);
            Utc.timestamp_opt(seconds, nanos as u32).single()
        }
        _ => None,
    }
}

/// Check whether an instant lies in the past at call time.
///
/// An absent date is NOT past: callers must never treat a null date as an
/// expired one.
pub fn is_past(instant: Option<DateTime<Utc>>) -> bool {
    matches!(instant, Some(t) if t < Utc::now())
}
