use serde_json::{Map, Value};

/// String fields that may carry a nested payload in a telemetry envelope.
pub const PAYLOAD_FIELDS: &[&str] = &["textPayload", "payload", "message"];

/// Object field carrying an already-structured payload.
pub const STRUCTURED_PAYLOAD_FIELD: &str = "jsonPayload";

/// One undifferentiated unit of input, before extraction.
#[derive(Debug, Clone, PartialEq)]
pub enum RawRecord {
    Json(Value),
    Text(String),
}

impl From<Value> for RawRecord {
    fn from(value: Value) -> Self {
        RawRecord::Json(value)
    }
}

impl From<&str> for RawRecord {
    fn from(line: &str) -> Self {
        RawRecord::Text(line.to_string())
    }
}

/// The known record layouts, decided once per record by [`shape_of`].
#[derive(Debug, Clone, Copy)]
pub enum RecordShape<'a> {
    /// Outer object whose payload is a string to be decoded.
    Envelope {
        payload: &'a str,
        outer: &'a Map<String, Value>,
    },
    /// Outer object whose payload is already an object.
    StructuredEnvelope {
        payload: &'a Map<String, Value>,
        outer: &'a Map<String, Value>,
    },
    /// `[timestamp, action, id, url]`
    Quad {
        timestamp: &'a Value,
        action: &'a Value,
        url: &'a Value,
    },
    /// `[timestamp, url, duration]`
    Triple {
        timestamp: &'a Value,
        url: &'a Value,
        duration: &'a Value,
    },
    Flat(&'a Map<String, Value>),
    TextLine(&'a str),
    Unrecognized,
}

impl RecordShape<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            RecordShape::Envelope { .. } => "envelope",
            RecordShape::StructuredEnvelope { .. } => "structured-envelope",
            RecordShape::Quad { .. } => "quad",
            RecordShape::Triple { .. } => "triple",
            RecordShape::Flat(_) => "flat",
            RecordShape::TextLine(_) => "text",
            RecordShape::Unrecognized => "unrecognized",
        }
    }
}

/// Decide which layout a record has. Pure; looks only at structure.
pub fn shape_of(record: &RawRecord) -> RecordShape<'_> {
    match record {
        RawRecord::Text(line) => RecordShape::TextLine(line.as_str()),
        RawRecord::Json(value) => shape_of_value(value),
    }
}

/// Same as [`shape_of`] for a bare JSON value (used for decoded payloads too).
pub fn shape_of_value(value: &Value) -> RecordShape<'_> {
    match value {
        Value::Array(items) => match items.as_slice() {
            [timestamp, action, _id, url] => RecordShape::Quad {
                timestamp,
                action,
                url,
            },
            [timestamp, url, duration] => RecordShape::Triple {
                timestamp,
                url,
                duration,
            },
            _ => RecordShape::Unrecognized,
        },
        Value::Object(outer) => {
            if let Some(payload) = PAYLOAD_FIELDS
                .iter()
                .find_map(|field| outer.get(*field).and_then(Value::as_str))
            {
                return RecordShape::Envelope { payload, outer };
            }
            if let Some(Value::Object(payload)) = outer.get(STRUCTURED_PAYLOAD_FIELD) {
                return RecordShape::StructuredEnvelope { payload, outer };
            }
            RecordShape::Flat(outer)
        }
        Value::String(line) => RecordShape::TextLine(line.as_str()),
        _ => RecordShape::Unrecognized,
    }
}
