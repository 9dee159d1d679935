use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// The slice of an HTTP Archive entry needed to time a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarEntry {
    #[serde(rename = "startedDateTime")]
    pub started_date_time: String,
    /// Total elapsed time in ms, `-1` when unknown
    pub time: f64,
    pub request: HarRequest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarRequest {
    pub url: String,
}

impl HarEntry {
    /// Flat record with `url`, `timestamp` and, when known, `duration`.
    pub fn to_record(&self) -> Value {
        if self.time >= 0.0 {
            json!({
                "url": self.request.url,
                "timestamp": self.started_date_time,
                "duration": self.time,
            })
        } else {
            json!({
                "url": self.request.url,
                "timestamp": self.started_date_time,
            })
        }
    }
}

/// `log.entries` when the value looks like an HTTP Archive.
pub fn har_entries(value: &Value) -> Option<&Vec<Value>> {
    value.get("log")?.get("entries")?.as_array()
}
