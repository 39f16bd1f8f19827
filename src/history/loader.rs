//! Loading heap event streams from JSON
//!
//! The stream is a JSON array of records, each an object with a `type` field:
//!
//! ```text
//! [
//!   {"type": "alloc", "address": 2097152, "size": 512, "tag": "parser"},
//!   {"type": "event", "tag": "phase 2", "color": "#FF8000"},
//!   {"type": "free", "address": 2097152}
//! ]
//! ```
//!
//! Records of an unknown type are ignored. Records missing a mandatory field,
//! or with a field of the wrong type, are skipped with a warning. Neither
//! stops the load.

use super::annotation::Rgb;
use super::errors::{LoadError, RecordError};
use super::recorder::HeapHistory;
use serde::Deserialize;
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info, trace, warn};

/// Mandatory fields per record type.
const MANDATORY_FIELDS: &[(&str, &[&str])] = &[
    ("alloc", &["address", "size"]),
    ("free", &["address"]),
    ("rangefree", &["low", "high"]),
    ("event", &[]),
    ("address", &["address"]),
    ("filterrange", &["low", "high"]),
];

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum EventRecord {
    #[serde(rename = "alloc")]
    Alloc {
        address: u64,
        size: u32,
        #[serde(default)]
        tag: String,
    },
    #[serde(rename = "free")]
    Free {
        address: u64,
        #[serde(default)]
        tag: String,
    },
    #[serde(rename = "rangefree")]
    RangeFree {
        low: u64,
        high: u64,
        #[serde(default)]
        tag: String,
    },
    #[serde(rename = "event")]
    Event {
        #[serde(default)]
        tag: String,
        color: Option<String>,
    },
    #[serde(rename = "address")]
    Address {
        address: u64,
        #[serde(default)]
        tag: String,
        color: Option<String>,
    },
    #[serde(rename = "filterrange")]
    FilterRange { low: u64, high: u64 },
}

/// Counts from one load call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Records applied to the history
    pub records: usize,
    /// Records dropped as malformed
    pub skipped: usize,
    /// Records of an unknown type
    pub ignored: usize,
}

enum Parsed {
    Record(EventRecord),
    Unknown(String),
}

fn parse_record(value: Value) -> Result<Parsed, RecordError> {
    let record_type = match value.get("type").and_then(Value::as_str) {
        Some(record_type) => record_type.to_string(),
        None => return Err(RecordError::MissingType),
    };
    let Some((_, fields)) = MANDATORY_FIELDS
        .iter()
        .find(|(name, _)| *name == record_type)
    else {
        return Ok(Parsed::Unknown(record_type));
    };
    if let Some(field) = fields.iter().find(|field| value.get(**field).is_none()) {
        return Err(RecordError::MissingField { record_type, field });
    }
    serde_json::from_value(value)
        .map(Parsed::Record)
        .map_err(|source| RecordError::Malformed {
            record_type,
            source,
        })
}

fn color_or_default(color: Option<String>) -> Rgb {
    color
        .as_deref()
        .map(Rgb::parse_or_default)
        .unwrap_or_default()
}

impl HeapHistory {
    fn apply_record(&mut self, record: EventRecord) {
        match record {
            EventRecord::Alloc { address, size, tag } => self.record_malloc(address, size, &tag, 0),
            EventRecord::Free { address, tag } => self.record_free(address, &tag, 0),
            EventRecord::RangeFree { low, high, tag } => {
                self.record_free_range(low, high, &tag, 0)
            }
            EventRecord::Event { tag, color } => self.record_event(&tag, color_or_default(color)),
            EventRecord::Address {
                address,
                tag,
                color,
            } => self.record_address(address, &tag, color_or_default(color)),
            EventRecord::FilterRange { low, high } => self.record_filter_range(low, high),
        }
    }

    /// Replay an already-parsed JSON array of records.
    pub fn load_from_json_value(&mut self, stream: Value) -> Result<LoadSummary, LoadError> {
        let Value::Array(records) = stream else {
            return Err(LoadError::NotAnArray);
        };

        let mut summary = LoadSummary::default();
        for (position, value) in records.into_iter().enumerate() {
            match parse_record(value) {
                Ok(Parsed::Record(record)) => {
                    self.apply_record(record);
                    summary.records += 1;
                }
                Ok(Parsed::Unknown(record_type)) => {
                    trace!("ignoring record {} of unknown type '{}'", position, record_type);
                    summary.ignored += 1;
                }
                Err(err) => {
                    warn!("skipping record {}: {}", position, err);
                    summary.skipped += 1;
                }
            }
        }

        self.finish_load(&summary);
        Ok(summary)
    }

    pub fn load_from_json_reader<R: Read>(&mut self, reader: R) -> Result<LoadSummary, LoadError> {
        let stream: Value = serde_json::from_reader(reader)?;
        self.load_from_json_value(stream)
    }

    pub fn load_from_json_str(&mut self, text: &str) -> Result<LoadSummary, LoadError> {
        let stream: Value = serde_json::from_str(text)?;
        self.load_from_json_value(stream)
    }

    pub fn load_from_path<P: AsRef<Path>>(&mut self, path: P) -> Result<LoadSummary, LoadError> {
        let file = File::open(path.as_ref())?;
        self.load_from_json_reader(BufReader::new(file))
    }

    fn finish_load(&mut self, summary: &LoadSummary) {
        for block in &self.blocks {
            if block.was_freed() {
                debug!("freed: {}", block.describe());
            } else {
                debug!("alive: {}", block.describe());
            }
        }
        self.reset_viewport_to_global();
        let levels = self.active_region_cache().levels();
        info!(
            "loaded {} records ({} skipped, {} ignored): {} blocks, {} live, {} conflicts, {} region levels",
            summary.records,
            summary.skipped,
            summary.ignored,
            self.blocks.len(),
            self.live_block_count(),
            self.conflicts.len(),
            levels
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_type() {
        assert!(matches!(
            parse_record(json!({"address": 1})),
            Err(RecordError::MissingType)
        ));
        assert!(matches!(parse_record(json!(5)), Err(RecordError::MissingType)));
    }

    #[test]
    fn test_missing_field() {
        match parse_record(json!({"type": "alloc", "address": 1})) {
            Err(RecordError::MissingField { record_type, field }) => {
                assert_eq!(record_type, "alloc");
                assert_eq!(field, "size");
            }
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_malformed_field() {
        assert!(matches!(
            parse_record(json!({"type": "alloc", "address": "0x10", "size": 4})),
            Err(RecordError::Malformed { .. })
        ));
        assert!(matches!(
            parse_record(json!({"type": "alloc", "address": 16, "size": 5_000_000_000u64})),
            Err(RecordError::Malformed { .. })
        ));
    }

    #[test]
    fn test_unknown_type() {
        assert!(matches!(
            parse_record(json!({"type": "mmap", "address": 1})),
            Ok(Parsed::Unknown(t)) if t == "mmap"
        ));
    }

    #[test]
    fn test_defaults() {
        let mut history = HeapHistory::new();
        let stream = r#"[{"type": "alloc", "address": 64, "size": 8}, {"type": "event"}]"#;
        let summary = history.load_from_json_str(stream).unwrap();
        assert_eq!(summary.records, 2);
        assert_eq!(&*history.blocks()[0].alloc_tag, "");
        assert_eq!(history.events()[&1].color, Rgb::DEFAULT);
        assert_eq!(history.events()[&1].label, "");
    }

    #[test]
    fn test_not_an_array() {
        let mut history = HeapHistory::new();
        assert!(matches!(
            history.load_from_json_str(r#"{"type": "alloc"}"#),
            Err(LoadError::NotAnArray)
        ));
        assert!(matches!(
            history.load_from_json_str("[{"),
            Err(LoadError::Json(_))
        ));
    }
}
