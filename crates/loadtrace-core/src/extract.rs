//! Entry extraction: one raw record in, zero or more normalized facts out.

use crate::record::{RawRecord, RecordShape, shape_of, shape_of_value};
use crate::timestamp::{parse_timestamp, parse_timestamp_value};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Candidate URL fields on a flat object, in priority order.
pub const URL_FIELDS: &[&str] = &["url", "uri", "path", "request", "resource", "src"];

/// Candidate timestamp fields on a flat object, in priority order.
pub const TIMESTAMP_FIELDS: &[&str] = &[
    "timestamp",
    "time",
    "ts",
    "datetime",
    "startTime",
    "start-time",
    "date",
    "receiveTimestamp",
    "receive-timestamp",
    "startedDateTime",
];

/// Fields carrying a precomputed duration in milliseconds.
pub const DURATION_FIELDS: &[&str] = &["duration", "loadTime", "responseTime"];

/// Fields carrying a start/end marker on a flat object.
pub const ACTION_FIELDS: &[&str] = &["action", "type", "event", "phase"];

/// Outer envelope timestamp fields, consulted after the payload's own.
const ENVELOPE_TIMESTAMP_FIELDS: &[&str] = &["timestamp", "receiveTimestamp"];

lazy_static! {
    static ref BARE_MARKER: Regex =
        Regex::new(r"^(?P<action>[+-])\s+(?P<id>\S+)\s+(?P<url>\S+)$").unwrap();
    static ref BARE_DURATION: Regex =
        Regex::new(r"^(?P<url>\S+)\s+(?P<ms>\d+(?:\.\d+)?)\s*ms$").unwrap();
    static ref TIMED_LINE: Regex = Regex::new(
        r"^(?P<ts>\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}\.\d{3}|\S+)\s+(?P<rest>.+)$"
    )
    .unwrap();
    static ref TIMED_MARKER: Regex = Regex::new(
        r"(?i)^(?P<action>[+-]|request_start|request_end|start|begin|end|finish)\s+(?:(?P<id>\S+)\s+)?(?P<url>\S+)$"
    )
    .unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Start,
    End,
    Unknown,
}

impl EventKind {
    /// Normalize a free-form action marker.
    pub fn from_action(action: &str) -> Self {
        match action.trim().to_lowercase().as_str() {
            "+" | "start" | "begin" | "request_start" => EventKind::Start,
            "-" | "end" | "finish" | "request_end" => EventKind::End,
            _ => EventKind::Unknown,
        }
    }

    fn from_value(value: &Value) -> Self {
        match value {
            Value::String(s) => Self::from_action(s),
            _ => EventKind::Unknown,
        }
    }
}

/// A start/end/unknown marker for one URL at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceEvent {
    pub url: String,
    pub timestamp_ms: i64,
    pub kind: EventKind,
}

/// A load whose duration was logged directly. The start may be unknown, in
/// which case the session anchors it when finalizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectInterval {
    pub url: String,
    pub start_ms: Option<i64>,
    pub duration_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    Event(ResourceEvent),
    Interval(DirectInterval),
}

pub struct EntryExtractor;

impl EntryExtractor {
    /// Extract every fact a record carries. Never fails; records with
    /// nothing usable yield an empty list.
    pub fn extract(record: &RawRecord) -> Vec<Extracted> {
        let shape = shape_of(record);
        let extracted = Self::extract_shape(shape, None);

        if extracted.is_empty() {
            tracing::debug!("Record ({}) yielded no events", shape.name());
        }
        extracted
    }

    fn extract_shape(shape: RecordShape<'_>, outer: Option<&Map<String, Value>>) -> Vec<Extracted> {
        match shape {
            RecordShape::Envelope { payload, outer } => {
                let found = Self::extract_payload(payload, outer);
                if found.is_empty() {
                    // The payload field was ordinary text; read the envelope itself
                    Self::extract_flat(outer, None).into_iter().collect()
                } else {
                    found
                }
            }
            RecordShape::StructuredEnvelope { payload, outer } => {
                Self::extract_flat(payload, Some(outer)).into_iter().collect()
            }
            RecordShape::Quad {
                timestamp,
                action,
                url,
            } => Self::extract_quad(timestamp, action, url, outer)
                .into_iter()
                .collect(),
            RecordShape::Triple {
                timestamp,
                url,
                duration,
            } => Self::extract_triple(timestamp, url, duration, outer)
                .into_iter()
                .collect(),
            RecordShape::Flat(map) => Self::extract_flat(map, outer).into_iter().collect(),
            RecordShape::TextLine(line) => Self::extract_line(line).into_iter().collect(),
            RecordShape::Unrecognized => vec![],
        }
    }

    /// Decode a nested payload string, falling back to the text patterns.
    fn extract_payload(payload: &str, outer: &Map<String, Value>) -> Vec<Extracted> {
        match serde_json::from_str::<Value>(payload) {
            Ok(decoded @ (Value::Array(_) | Value::Object(_))) => {
                Self::extract_shape(shape_of_value(&decoded), Some(outer))
            }
            _ => Self::extract_payload_text(payload.trim(), outer)
                .into_iter()
                .collect(),
        }
    }

    fn extract_payload_text(text: &str, outer: &Map<String, Value>) -> Option<Extracted> {
        if let Some(caps) = BARE_MARKER.captures(text) {
            let url = valid_url(&caps["url"])?;
            let timestamp_ms = envelope_timestamp(outer)?;
            return Some(Extracted::Event(ResourceEvent {
                url,
                timestamp_ms,
                kind: EventKind::from_action(&caps["action"]),
            }));
        }

        if let Some(caps) = BARE_DURATION.captures(text) {
            let url = valid_url(&caps["url"])?;
            let duration_ms = parse_duration_str(&caps["ms"])?;
            return Some(Extracted::Interval(DirectInterval {
                url,
                start_ms: envelope_timestamp(outer),
                duration_ms,
            }));
        }

        None
    }

    fn extract_quad(
        timestamp: &Value,
        action: &Value,
        url: &Value,
        outer: Option<&Map<String, Value>>,
    ) -> Option<Extracted> {
        let url = coerce_url(url)?;
        let timestamp_ms = parse_timestamp_value(timestamp)
            .or_else(|| outer.and_then(envelope_timestamp));
        let Some(timestamp_ms) = timestamp_ms else {
            tracing::debug!("Dropping event for {}: no resolvable timestamp", url);
            return None;
        };

        Some(Extracted::Event(ResourceEvent {
            url,
            timestamp_ms,
            kind: EventKind::from_value(action),
        }))
    }

    fn extract_triple(
        timestamp: &Value,
        url: &Value,
        duration: &Value,
        outer: Option<&Map<String, Value>>,
    ) -> Option<Extracted> {
        let url = coerce_url(url)?;
        let duration_ms = coerce_duration(duration)?;
        let start_ms = parse_timestamp_value(timestamp)
            .or_else(|| outer.and_then(envelope_timestamp));

        Some(Extracted::Interval(DirectInterval {
            url,
            start_ms,
            duration_ms,
        }))
    }

    fn extract_flat(
        map: &Map<String, Value>,
        outer: Option<&Map<String, Value>>,
    ) -> Option<Extracted> {
        let url = URL_FIELDS
            .iter()
            .filter_map(|field| map.get(*field))
            .find_map(coerce_url)?;

        // Only the first timestamp field present counts; a bad value there
        // is not rescued by a later field.
        let timestamp_ms = match TIMESTAMP_FIELDS.iter().find_map(|field| map.get(*field)) {
            Some(value) => parse_timestamp_value(value),
            None => None,
        }
        .or_else(|| outer.and_then(envelope_timestamp));

        if let Some(duration_ms) = DURATION_FIELDS
            .iter()
            .filter_map(|field| map.get(*field))
            .find_map(coerce_duration)
        {
            return Some(Extracted::Interval(DirectInterval {
                url,
                start_ms: timestamp_ms,
                duration_ms,
            }));
        }

        let Some(timestamp_ms) = timestamp_ms else {
            tracing::debug!("Dropping flat record for {}: no resolvable timestamp", url);
            return None;
        };

        let kind = ACTION_FIELDS
            .iter()
            .find_map(|field| map.get(*field))
            .map(EventKind::from_value)
            .unwrap_or(EventKind::Unknown);

        Some(Extracted::Event(ResourceEvent {
            url,
            timestamp_ms,
            kind,
        }))
    }

    /// Plain text line: `<ts> <action> [<id>] <url>`, `<ts> <url> <N>ms`,
    /// or a bare `<url> <N>ms`.
    fn extract_line(line: &str) -> Option<Extracted> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        if let Some(caps) = TIMED_LINE.captures(line)
            && let Some(timestamp_ms) = parse_timestamp(&caps["ts"])
        {
            let rest = caps["rest"].trim();

            if let Some(marker) = TIMED_MARKER.captures(rest) {
                return Some(Extracted::Event(ResourceEvent {
                    url: valid_url(&marker["url"])?,
                    timestamp_ms,
                    kind: EventKind::from_action(&marker["action"]),
                }));
            }

            if let Some(timed) = BARE_DURATION.captures(rest) {
                return Some(Extracted::Interval(DirectInterval {
                    url: valid_url(&timed["url"])?,
                    start_ms: Some(timestamp_ms),
                    duration_ms: parse_duration_str(&timed["ms"])?,
                }));
            }
        }

        if let Some(caps) = BARE_DURATION.captures(line) {
            return Some(Extracted::Interval(DirectInterval {
                url: valid_url(&caps["url"])?,
                start_ms: None,
                duration_ms: parse_duration_str(&caps["ms"])?,
            }));
        }

        None
    }
}

/// True for strings that stand for "no value" rather than a URL.
pub fn is_nothing_marker(candidate: &str) -> bool {
    let trimmed = candidate.trim();
    trimmed.is_empty() || trimmed == "null" || trimmed == "undefined"
}

fn valid_url(candidate: &str) -> Option<String> {
    let trimmed = candidate.trim();
    if is_nothing_marker(trimmed) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Coerce a URL field: strings are used directly, objects contribute their
/// `href` (or `url`) member, numbers their decimal form.
fn coerce_url(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => valid_url(s),
        Value::Object(map) => ["href", "url"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .and_then(valid_url),
        Value::Number(n) => valid_url(&n.to_string()),
        Value::Null | Value::Bool(_) | Value::Array(_) => None,
    }
}

/// Largest duration accepted from a record, in milliseconds.
pub const MAX_LOGGED_DURATION_MS: i64 = i64::MAX / 2;

/// Durations are non-negative milliseconds, rounded to whole milliseconds,
/// and at most [`MAX_LOGGED_DURATION_MS`].
fn coerce_duration(value: &Value) -> Option<i64> {
    let ms = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if ms.is_finite() && ms >= 0.0 && ms <= MAX_LOGGED_DURATION_MS as f64 {
        Some(ms.round() as i64)
    } else {
        tracing::debug!("Rejecting duration value {}", ms);
        None
    }
}

fn parse_duration_str(raw: &str) -> Option<i64> {
    coerce_duration(&Value::String(raw.to_string()))
}

fn envelope_timestamp(outer: &Map<String, Value>) -> Option<i64> {
    ENVELOPE_TIMESTAMP_FIELDS
        .iter()
        .filter_map(|field| outer.get(*field))
        .find_map(parse_timestamp_value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const T0: i64 = 1_735_689_600_000;

    fn extract_json(value: Value) -> Vec<Extracted> {
        EntryExtractor::extract(&RawRecord::Json(value))
    }

    fn event(url: &str, timestamp_ms: i64, kind: EventKind) -> Extracted {
        Extracted::Event(ResourceEvent {
            url: url.to_string(),
            timestamp_ms,
            kind,
        })
    }

    fn interval(url: &str, start_ms: Option<i64>, duration_ms: i64) -> Extracted {
        Extracted::Interval(DirectInterval {
            url: url.to_string(),
            start_ms,
            duration_ms,
        })
    }

    #[test]
    fn test_action_normalization() {
        for action in ["+", "start", "BEGIN", "request_start"] {
            assert_eq!(EventKind::from_action(action), EventKind::Start);
        }
        for action in ["-", "end", "Finish", "request_end"] {
            assert_eq!(EventKind::from_action(action), EventKind::End);
        }
        assert_eq!(EventKind::from_action("progress"), EventKind::Unknown);
    }

    #[test]
    fn test_top_level_quad() {
        let out = extract_json(json!(["2025-01-01T00:00:00.500Z", "-", 1, "https://x.com/a.js"]));
        assert_eq!(out, vec![event("https://x.com/a.js", T0 + 500, EventKind::End)]);
    }

    #[test]
    fn test_top_level_triple() {
        let out = extract_json(json!(["2025-01-01T00:00:00.000Z", "https://x.com/a.css", 250]));
        assert_eq!(out, vec![interval("https://x.com/a.css", Some(T0), 250)]);
    }

    #[test]
    fn test_envelope_payload_timestamp_wins() {
        let out = extract_json(json!({
            "textPayload": "[\"2025-01-01T00:00:00.000Z\",\"+\",7,\"https://x.com/api/users\"]",
            "timestamp": "2025-01-01T00:00:09.000Z",
            "receiveTimestamp": "2025-01-01T00:00:10.000Z"
        }));
        assert_eq!(out, vec![event("https://x.com/api/users", T0, EventKind::Start)]);
    }

    #[test]
    fn test_envelope_falls_back_to_outer_timestamps() {
        let out = extract_json(json!({
            "textPayload": "[\"garbage\",\"+\",7,\"https://x.com/api/users\"]",
            "timestamp": "not a time",
            "receiveTimestamp": "2025-01-01T00:00:10.000Z"
        }));
        assert_eq!(
            out,
            vec![event("https://x.com/api/users", T0 + 10_000, EventKind::Start)]
        );
    }

    #[test]
    fn test_envelope_text_fallbacks() {
        let marker = extract_json(json!({
            "textPayload": "- 12 https://x.com/app.js",
            "timestamp": "2025-01-01T00:00:01.000Z"
        }));
        assert_eq!(marker, vec![event("https://x.com/app.js", T0 + 1000, EventKind::End)]);

        let timed = extract_json(json!({
            "textPayload": "https://x.com/hero.jpg 320ms",
            "timestamp": "2025-01-01T00:00:01.000Z"
        }));
        assert_eq!(timed, vec![interval("https://x.com/hero.jpg", Some(T0 + 1000), 320)]);
    }

    #[test]
    fn test_envelope_with_plain_message_reads_outer_fields() {
        let out = extract_json(json!({
            "message": "request finished",
            "url": "https://x.com/b.png",
            "loadTime": 90
        }));
        assert_eq!(out, vec![interval("https://x.com/b.png", None, 90)]);
    }

    #[test]
    fn test_structured_envelope() {
        let out = extract_json(json!({
            "jsonPayload": {"uri": "https://x.com/font.woff2", "action": "start"},
            "timestamp": "2025-01-01T00:00:02.000Z"
        }));
        assert_eq!(
            out,
            vec![event("https://x.com/font.woff2", T0 + 2000, EventKind::Start)]
        );
    }

    #[test]
    fn test_flat_direct_duration_without_timestamp() {
        let out = extract_json(json!({"url": "https://x.com/b.png", "duration": 300}));
        assert_eq!(out, vec![interval("https://x.com/b.png", None, 300)]);
    }

    #[test]
    fn test_flat_field_priority() {
        let out = extract_json(json!({
            "src": "https://x.com/ignored.js",
            "url": "https://x.com/used.js",
            "date": "2025-01-01T00:00:05.000Z",
            "ts": 1735689600001_i64,
            "type": "end"
        }));
        assert_eq!(out, vec![event("https://x.com/used.js", T0 + 1, EventKind::End)]);
    }

    #[test]
    fn test_flat_garbage_timestamp_is_not_rescued() {
        let out = extract_json(json!({
            "url": "https://x.com/a.js",
            "timestamp": "garbage",
            "time": T0,
            "action": "start"
        }));
        assert!(out.is_empty());
    }

    #[test]
    fn test_absurd_durations_rejected() {
        assert!(extract_json(json!({"url": "https://x.com/b.png", "timestamp": T0, "duration": 1e19})).is_empty());
        assert!(extract_json(json!(["2025-01-01T00:00:00.000Z", "https://x.com/b.png", "9e300"])).is_empty());
        assert_eq!(
            extract_json(json!({"url": "https://x.com/b.png", "timestamp": T0, "duration": 86_400_000})),
            vec![interval("https://x.com/b.png", Some(T0), 86_400_000)]
        );
    }

    #[test]
    fn test_envelope_payload_triple() {
        let out = extract_json(json!({
            "textPayload": "[\"2025-01-01T00:00:01.000Z\", \"https://x.com/hero.webp\", 640]",
            "timestamp": "2025-01-01T00:00:09.000Z"
        }));
        assert_eq!(out, vec![interval("https://x.com/hero.webp", Some(T0 + 1000), 640)]);
    }

    #[test]
    fn test_envelope_triple_with_bad_payload_time_uses_outer() {
        let out = extract_json(json!({
            "payload": "[\"not-a-time\", \"https://x.com/api/cart\", \"215\"]",
            "timestamp": "2025-01-01T00:00:03.000Z",
            "receiveTimestamp": "2025-01-01T00:00:04.000Z"
        }));
        assert_eq!(out, vec![interval("https://x.com/api/cart", Some(T0 + 3000), 215)]);
    }

    #[test]
    fn test_flat_structured_url() {
        let out = extract_json(json!({
            "request": {"href": " https://x.com/page.html "},
            "timestamp": "2025-01-01T00:00:00.000Z"
        }));
        assert_eq!(out, vec![event("https://x.com/page.html", T0, EventKind::Unknown)]);
    }

    #[test]
    fn test_nothing_markers_rejected() {
        assert!(extract_json(json!({"url": "null", "timestamp": T0})).is_empty());
        assert!(extract_json(json!({"url": "undefined", "duration": 5})).is_empty());
        assert!(extract_json(json!({"url": "  ", "timestamp": T0})).is_empty());
        assert!(extract_json(json!({"url": {"name": "x"}, "timestamp": T0})).is_empty());
    }

    #[test]
    fn test_unresolvable_records_dropped() {
        assert!(extract_json(json!({"url": "https://x.com/a.js"})).is_empty());
        assert!(extract_json(json!({"timestamp": T0})).is_empty());
        assert!(extract_json(json!({"url": "https://x.com/a.js", "duration": -4})).is_empty());
        assert!(extract_json(json!(17)).is_empty());
    }

    #[test]
    fn test_text_lines() {
        let quad = EntryExtractor::extract(&RawRecord::from(
            "2025-01-01 00:00:00.250 + 3 https://x.com/a.js",
        ));
        assert_eq!(quad, vec![event("https://x.com/a.js", T0 + 250, EventKind::Start)]);

        let short = EntryExtractor::extract(&RawRecord::from(
            "2025-01-01T00:00:00.000Z end https://x.com/a.js",
        ));
        assert_eq!(short, vec![event("https://x.com/a.js", T0, EventKind::End)]);

        let timed = EntryExtractor::extract(&RawRecord::from(
            "1735689600000 https://x.com/a.css 75ms",
        ));
        assert_eq!(timed, vec![interval("https://x.com/a.css", Some(T0), 75)]);

        let bare = EntryExtractor::extract(&RawRecord::from("https://x.com/a.css 75.4 ms"));
        assert_eq!(bare, vec![interval("https://x.com/a.css", None, 75)]);

        assert!(EntryExtractor::extract(&RawRecord::from("GET /health 200")).is_empty());
        assert!(EntryExtractor::extract(&RawRecord::from("+ 1 https://x.com/a.js")).is_empty());
    }
}
