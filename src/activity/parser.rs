//! Weekly event table reader.
//!
//! A week table is a CSV file (plain, `.gz` or `.zst`) whose header must
//! contain exactly the columns of [`event_columns`], in any order. A header
//! that differs is schema drift and fails the whole table; a bad row only
//! costs that row, which is reported as a [`RecordIssue`].

use super::types::{ActivityCode, Attribute, Event, EventAttributes};
use crate::error::{RecordError, RecordIssue, SchemaError};
use crate::utils::reader::open_file;
use crate::utils::time::parse_timestamp;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;

const IDENTITY_COLUMNS: [&str; 5] = ["id", "date", "user", "pc", "activity"];

/// Every column of a week table: identity columns, then attributes.
pub fn event_columns() -> Vec<&'static str> {
    IDENTITY_COLUMNS
        .into_iter()
        .chain(Attribute::ALL.into_iter().map(Attribute::column))
        .collect()
}

/// Parsed contents of one week table.
#[derive(Debug, Default)]
pub struct WeekTable {
    pub week: u32,
    pub events: Vec<Event>,
    /// Line number of each entry of `events`
    pub lines: Vec<usize>,
    pub issues: Vec<RecordIssue>,
    /// Data rows seen, including rejected ones
    pub rows: usize,
}

/// Week number encoded as the leading digits of the file stem
/// (`12.csv`, `12_num.csv.gz`, `week_12.csv` are all week 12).
pub fn week_from_path(path: impl AsRef<Path>) -> Result<u32> {
    let path = path.as_ref();
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Invalid file name: {}", path.display()))?;
    let stem = name.split('.').next().unwrap_or(name);
    let stem = stem.strip_prefix("week_").unwrap_or(stem);
    let digits: String = stem.chars().take_while(char::is_ascii_digit).collect();

    digits
        .parse()
        .with_context(|| format!("No week number in file name: {}", path.display()))
}

/// Column positions resolved from a header row.
struct ColumnMap {
    identity: [usize; 5],
    attributes: [usize; Attribute::COUNT],
}

impl ColumnMap {
    fn from_header(header: &csv::StringRecord) -> Result<Self, SchemaError> {
        let mut positions: HashMap<&str, usize> = HashMap::new();
        for (idx, name) in header.iter().enumerate() {
            let name = name.trim();
            if positions.insert(name, idx).is_some() {
                return Err(SchemaError::DuplicateColumn(name.to_string()));
            }
        }

        let expected = event_columns();
        let missing: Vec<String> = expected
            .iter()
            .filter(|c| !positions.contains_key(**c))
            .map(|c| (*c).to_string())
            .collect();
        if !missing.is_empty() {
            return Err(SchemaError::MissingColumns(missing));
        }

        let mut unexpected: Vec<String> = positions
            .keys()
            .filter(|c| !expected.iter().any(|e| *e == **c))
            .map(|c| (*c).to_string())
            .collect();
        if !unexpected.is_empty() {
            unexpected.sort();
            return Err(SchemaError::UnexpectedColumns(unexpected));
        }

        let identity = IDENTITY_COLUMNS.map(|c| positions[c]);
        let attributes = Attribute::ALL.map(|a| positions[a.column()]);
        Ok(Self {
            identity,
            attributes,
        })
    }

    fn parse_row(&self, row: &csv::StringRecord) -> Result<Event, RecordError> {
        let field = |idx: usize| row.get(idx).unwrap_or("").trim();
        let [id_col, date_col, user_col, pc_col, activity_col] = self.identity;

        let id = field(id_col);
        if id.is_empty() {
            return Err(RecordError::MissingField("id"));
        }
        let user = field(user_col);
        if user.is_empty() {
            return Err(RecordError::MissingField("user"));
        }
        let pc = field(pc_col);
        if pc.is_empty() {
            return Err(RecordError::MissingField("pc"));
        }
        let timestamp = parse_timestamp(field(date_col))?;
        let raw_activity = field(activity_col);
        let activity = ActivityCode::parse(raw_activity)
            .ok_or_else(|| RecordError::UnknownActivity(raw_activity.to_string()))?;

        let mut attributes = EventAttributes::default();
        for (attribute, &col) in Attribute::ALL.iter().zip(self.attributes.iter()) {
            let raw = field(col);
            if raw.is_empty() {
                continue;
            }
            let value: f64 = raw.parse().map_err(|_| RecordError::BadNumber {
                column: attribute.column(),
                value: raw.to_string(),
            })?;
            if !value.is_finite() {
                return Err(RecordError::BadNumber {
                    column: attribute.column(),
                    value: raw.to_string(),
                });
            }
            attributes.set(*attribute, value);
        }

        Ok(Event {
            id: id.to_string(),
            user: user.to_string(),
            pc: pc.to_string(),
            timestamp,
            activity,
            attributes,
        })
    }
}

/// Read a week table from any `Read` source.
///
/// Schema problems come back as a [`SchemaError`] inside the `anyhow`
/// error so callers can `downcast_ref` to tell drift apart from I/O.
pub fn read_week_events<R: std::io::Read>(reader: R, week: u32) -> Result<WeekTable> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(reader);

    let header = csv_reader
        .headers()
        .context("Failed to read table header")?
        .clone();
    let columns = ColumnMap::from_header(&header)?;

    let mut table = WeekTable {
        week,
        ..WeekTable::default()
    };

    for (idx, result) in csv_reader.records().enumerate() {
        table.rows += 1;
        let fallback_line = idx + 2;

        let row = match result {
            Ok(row) => row,
            Err(e) if e.is_io_error() => {
                return Err(e).context("Failed to read table row");
            }
            Err(e) => {
                let line = e
                    .position()
                    .map_or(fallback_line, |p| p.line() as usize);
                table.issues.push(RecordIssue {
                    line,
                    event_id: None,
                    error: RecordError::Malformed(e.to_string()),
                });
                continue;
            }
        };

        let line = row
            .position()
            .map_or(fallback_line, |p| p.line() as usize);
        match columns.parse_row(&row) {
            Ok(event) => {
                table.events.push(event);
                table.lines.push(line);
            }
            Err(error) => {
                let event_id = row
                    .get(columns.identity[0])
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string);
                table.issues.push(RecordIssue {
                    line,
                    event_id,
                    error,
                });
            }
        }
    }

    Ok(table)
}

/// Open and read the week table at `path`; the week number comes from the
/// file name.
pub fn read_week_table(path: impl AsRef<Path>) -> Result<WeekTable> {
    let path = path.as_ref();
    let week = week_from_path(path)?;
    let file = open_file(path)?;
    read_week_events(file, week)
        .with_context(|| format!("Failed to read week table: {}", path.display()))
}
