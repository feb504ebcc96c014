//! Typed failures for the weekly session pipeline.
//!
//! Two classes of problems are distinguished:
//!
//! - [`RecordError`] - a single event row is unusable. The row is dropped,
//!   reported, and the rest of the week continues.
//! - [`SchemaError`] - the shape of a table is not what the pipeline expects.
//!   The affected week fails as a whole; nothing is published for it.
//!
//! Everything else (I/O, JSON) travels as `anyhow::Error` with context, the
//! same way the commands report it.

use thiserror::Error;

/// A data-quality problem with one event record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("unparseable timestamp '{0}'")]
    BadTimestamp(String),

    #[error("unknown activity '{0}'")]
    UnknownActivity(String),

    #[error("missing {0}")]
    MissingField(&'static str),

    #[error("user '{0}' is not in the roster")]
    UnknownUser(String),

    #[error("column '{column}' holds non-numeric value '{value}'")]
    BadNumber { column: &'static str, value: String },

    #[error("malformed row: {0}")]
    Malformed(String),
}

/// The table layout differs from the one the pipeline was built for.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("unexpected columns: {}", .0.join(", "))]
    UnexpectedColumns(Vec<String>),

    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),

    #[error("header of {path} does not match {reference}")]
    HeaderMismatch { path: String, reference: String },
}

/// A rejected record together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordIssue {
    /// 1-based data line number (the header is line 1)
    pub line: usize,
    /// Event id, when the row got far enough to have one
    pub event_id: Option<String>,
    pub error: RecordError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_error_messages() {
        let err = RecordError::BadNumber {
            column: "file_len",
            value: "abc".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "column 'file_len' holds non-numeric value 'abc'"
        );
        assert_eq!(
            RecordError::MissingField("pc").to_string(),
            "missing pc"
        );
    }

    #[test]
    fn test_schema_error_lists_columns() {
        let err = SchemaError::MissingColumns(vec!["usb_dur".into(), "disk".into()]);
        assert_eq!(err.to_string(), "missing columns: usb_dur, disk");
    }
}
