//! Error types for loading event streams
//!
//! [`LoadError`] aborts a load call; [`RecordError`] only ever drops the one
//! record it describes and is logged rather than returned.

use std::fmt;
use std::io;

/// A load call failed as a whole. Records applied before the failure stay in
/// the history.
#[derive(Debug)]
pub enum LoadError {
    /// The input could not be read
    Io(io::Error),

    /// The input is not valid JSON
    Json(serde_json::Error),

    /// The top-level JSON value is not an array of records
    NotAnArray,
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io(err) => write!(f, "Failed to read event stream: {}", err),
            LoadError::Json(err) => write!(f, "Malformed event stream: {}", err),
            LoadError::NotAnArray => write!(f, "Event stream must be a JSON array of records"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io(err) => Some(err),
            LoadError::Json(err) => Some(err),
            LoadError::NotAnArray => None,
        }
    }
}

impl From<io::Error> for LoadError {
    fn from(err: io::Error) -> Self {
        LoadError::Io(err)
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            LoadError::Io(err.into())
        } else {
            LoadError::Json(err)
        }
    }
}

/// Why a single record was skipped.
#[derive(Debug)]
pub enum RecordError {
    /// The record is not an object with a string `type` field
    MissingType,

    /// A field the record's type requires is absent
    MissingField {
        record_type: String,
        field: &'static str,
    },

    /// A field is present but has the wrong type or range
    Malformed {
        record_type: String,
        source: serde_json::Error,
    },
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordError::MissingType => write!(f, "Record has no type field"),
            RecordError::MissingField { record_type, field } => {
                write!(f, "Record of type '{}' is missing field '{}'", record_type, field)
            }
            RecordError::Malformed {
                record_type,
                source,
            } => write!(f, "Malformed '{}' record: {}", record_type, source),
        }
    }
}

impl std::error::Error for RecordError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RecordError::Malformed { source, .. } => Some(source),
            _ => None,
        }
    }
}
