use super::har::{HarEntry, har_entries};
use crate::record::RawRecord;
use crate::{Error, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Object fields that may wrap the record array, checked in order.
pub const WRAPPER_FIELDS: &[&str] = &[
    "entries", "logs", "events", "records", "data", "items", "requests",
];

pub struct LogReader;

impl LogReader {
    /// Read a log file and split it into raw records
    pub fn from_file(path: &Path) -> Result<Vec<RawRecord>> {
        tracing::debug!("Reading log file from: {}", path.display());

        let bytes = fs::read(path)?;
        let content = String::from_utf8(bytes).map_err(|e| {
            Error::InvalidStructure(format!("{} is not UTF-8 text: {}", path.display(), e))
        })?;
        let records = Self::from_str(&content);

        tracing::info!(
            "Read {} records from {}",
            records.len(),
            path.display()
        );

        Ok(records)
    }

    /// Split log content into raw records. Never fails: anything that is not
    /// JSON is kept as a text line for the extractor to try.
    pub fn from_str(content: &str) -> Vec<RawRecord> {
        if content.trim().is_empty() {
            tracing::warn!("Log content is empty");
            return Vec::new();
        }

        match serde_json::from_str::<Value>(content) {
            Ok(document) => Self::from_document(document),
            Err(_) => Self::from_lines(content),
        }
    }

    fn from_document(document: Value) -> Vec<RawRecord> {
        if let Some(entries) = har_entries(&document) {
            tracing::debug!("Detected HTTP Archive with {} entries", entries.len());
            return entries
                .iter()
                .enumerate()
                .filter_map(|(idx, entry)| {
                    match serde_json::from_value::<HarEntry>(entry.clone()) {
                        Ok(entry) => Some(RawRecord::Json(entry.to_record())),
                        Err(e) => {
                            tracing::warn!("Skipping HAR entry {}: {}", idx, e);
                            None
                        }
                    }
                })
                .collect();
        }

        match document {
            Value::Array(items) => items.into_iter().map(RawRecord::Json).collect(),
            Value::Object(mut object) => {
                let wrapper = WRAPPER_FIELDS
                    .iter()
                    .find(|field| object.get(**field).is_some_and(Value::is_array));

                match wrapper.and_then(|field| object.remove(*field)) {
                    Some(Value::Array(items)) => {
                        tracing::debug!("Unwrapped {} records", items.len());
                        items.into_iter().map(RawRecord::Json).collect()
                    }
                    _ => vec![RawRecord::Json(Value::Object(object))],
                }
            }
            scalar => vec![RawRecord::Json(scalar)],
        }
    }

    fn from_lines(content: &str) -> Vec<RawRecord> {
        let mut json_lines = 0usize;
        let records: Vec<RawRecord> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| match serde_json::from_str::<Value>(line) {
                Ok(value @ (Value::Object(_) | Value::Array(_))) => {
                    json_lines += 1;
                    RawRecord::Json(value)
                }
                _ => RawRecord::Text(line.to_string()),
            })
            .collect();

        tracing::debug!(
            "Split {} lines ({} JSON, {} text)",
            records.len(),
            json_lines,
            records.len() - json_lines
        );
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_empty_content() {
        assert!(LogReader::from_str("").is_empty());
        assert!(LogReader::from_str("  \n\t\n").is_empty());
    }

    #[test]
    fn test_json_array() {
        let records = LogReader::from_str(
            r#"[["2025-01-01T00:00:00.000Z", "+", 1, "https://x.com/a.js"], {"url": "b"}]"#,
        );
        assert_eq!(records.len(), 2);
        assert_eq!(records[1], RawRecord::Json(json!({"url": "b"})));
    }

    #[test]
    fn test_wrapper_field() {
        let records = LogReader::from_str(
            r#"{"meta": {"v": 1}, "data": "not an array", "events": [{"url": "a"}, {"url": "b"}]}"#,
        );
        assert_eq!(
            records,
            vec![
                RawRecord::Json(json!({"url": "a"})),
                RawRecord::Json(json!({"url": "b"})),
            ]
        );
    }

    #[test]
    fn test_single_object() {
        let records = LogReader::from_str(r#"{"url": "https://x.com/a.js", "duration": 10}"#);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_har_document() {
        let har = json!({
            "log": {
                "version": "1.2",
                "creator": {"name": "test", "version": "1.0"},
                "entries": [
                    {
                        "startedDateTime": "2025-01-01T00:00:00.000Z",
                        "time": 120.0,
                        "request": {"method": "GET", "url": "https://x.com/"}
                    },
                    {"broken": true}
                ]
            }
        });
        let records = LogReader::from_str(&har.to_string());
        assert_eq!(
            records,
            vec![RawRecord::Json(json!({
                "url": "https://x.com/",
                "timestamp": "2025-01-01T00:00:00.000Z",
                "duration": 120.0
            }))]
        );
    }

    #[test]
    fn test_line_delimited_mix() {
        let content = "\
{\"url\": \"https://x.com/a.js\", \"timestamp\": \"2025-01-01T00:00:00.000Z\", \"action\": \"start\"}

2025-01-01T00:00:00.500Z - 7 https://x.com/a.js
42
";
        let records = LogReader::from_str(content);
        assert_eq!(records.len(), 3);
        assert!(matches!(records[0], RawRecord::Json(_)));
        assert_eq!(
            records[1],
            RawRecord::Text("2025-01-01T00:00:00.500Z - 7 https://x.com/a.js".to_string())
        );
        // Scalars are not records on their own line
        assert_eq!(records[2], RawRecord::Text("42".to_string()));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.log");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "2025-01-01 00:00:00.000 https://x.com/a.css 300ms").unwrap();

        let records = LogReader::from_file(&path).unwrap();
        assert_eq!(records.len(), 1);

        assert!(matches!(
            LogReader::from_file(&dir.path().join("missing.log")),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_binary_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.bin");
        fs::write(&path, [0xff, 0xfe, 0x00, 0x80]).unwrap();

        assert!(matches!(
            LogReader::from_file(&path),
            Err(Error::InvalidStructure(_))
        ));
    }
}
