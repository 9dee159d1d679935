//! Timestamp normalization to epoch milliseconds.
//!
//! String inputs are tried against a fixed list of patterns and the first one
//! that matches decides how the value is read. A value that matches a pattern
//! but does not denote a real instant (e.g. month 13) is a failure, it does
//! not fall through to the next pattern.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

lazy_static! {
    static ref ISO_MILLIS_UTC: Regex =
        Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d{3}Z$").unwrap();
    static ref SPACED_MILLIS: Regex =
        Regex::new(r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}\.\d{3}$").unwrap();
    static ref EPOCH_MILLIS: Regex = Regex::new(r"^\d{13}$").unwrap();
}

/// Zone-less layouts accepted by the generic fallback, read as UTC.
const NAIVE_LAYOUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Zoned layouts accepted by the generic fallback (common log format first).
const ZONED_LAYOUTS: &[&str] = &["%d/%b/%Y:%H:%M:%S %z", "%Y-%m-%d %H:%M:%S%.f %z"];

/// Parse a timestamp string into epoch milliseconds.
///
/// Patterns, in order: ISO-8601 with milliseconds and `Z`, then
/// `YYYY-MM-DD HH:MM:SS.mmm` (UTC), then a bare 13-digit epoch-ms integer,
/// then a generic date parser. Returns `None` when nothing matches.
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if ISO_MILLIS_UTC.is_match(raw) {
        return NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.3fZ")
            .ok()
            .map(|dt| dt.and_utc().timestamp_millis());
    }

    if SPACED_MILLIS.is_match(raw) {
        return NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.3f")
            .ok()
            .map(|dt| dt.and_utc().timestamp_millis());
    }

    if EPOCH_MILLIS.is_match(raw) {
        return raw.parse::<i64>().ok();
    }

    parse_generic(raw)
}

/// Parse a JSON value holding a timestamp.
///
/// Strings follow [`parse_timestamp`]. Numbers are already epoch milliseconds;
/// fractional values are truncated.
pub fn parse_timestamp_value(value: &Value) -> Option<i64> {
    match value {
        Value::String(s) => parse_timestamp(s),
        Value::Number(n) => {
            if let Some(ms) = n.as_i64() {
                Some(ms)
            } else {
                n.as_f64()
                    .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                    .map(|f| f.trunc() as i64)
            }
        }
        _ => None,
    }
}

/// Render epoch milliseconds as an ISO-8601 UTC string.
pub fn format_timestamp(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| ms.to_string())
}

fn parse_generic(raw: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.timestamp_millis());
    }

    for layout in ZONED_LAYOUTS {
        if let Ok(dt) = DateTime::parse_from_str(raw, layout) {
            return Some(dt.timestamp_millis());
        }
    }

    for layout in NAIVE_LAYOUTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, layout) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp_millis());
    }

    tracing::debug!("Unparseable timestamp: {}", raw);
    None
}
