//! Timestamp parsing and calendar helpers for activity events.
//!
//! Activity logs carry naive wall-clock timestamps. Everything here works on
//! [`NaiveDateTime`]; when an epoch value is needed the wall clock is read as
//! UTC so results do not depend on the machine running the tool.

use crate::error::RecordError;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike, Utc, Weekday};

const EVENT_FORMATS: [&str; 2] = ["%m/%d/%Y %H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Parse an event timestamp.
///
/// Accepts the `MM/DD/YYYY HH:MM:SS` layout of the raw logs, the ISO-like
/// `YYYY-MM-DD HH:MM:SS`, and RFC 3339 (converted to UTC wall clock).
pub fn parse_timestamp(ts: &str) -> Result<NaiveDateTime, RecordError> {
    let ts = ts.trim();
    for format in EVENT_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(ts, format) {
            return Ok(dt);
        }
    }
    DateTime::parse_from_rfc3339(ts)
        .map(|dt| dt.with_timezone(&Utc).naive_utc())
        .map_err(|_| RecordError::BadTimestamp(ts.to_string()))
}

/// Seconds since the Unix epoch, reading the wall clock as UTC.
pub fn epoch_seconds(dt: &NaiveDateTime) -> i64 {
    dt.and_utc().timestamp()
}

/// Whole days between `origin` and the event's calendar date.
pub fn day_index(dt: &NaiveDateTime, origin: NaiveDate) -> i64 {
    (dt.date() - origin).num_days()
}

/// Time of day as fractional hours, minute resolution (07:30 -> 7.5).
pub fn clock_hours(dt: &NaiveDateTime) -> f64 {
    f64::from(dt.hour()) + f64::from(dt.minute()) / 60.0
}

/// Elapsed minutes from `start` to `end`.
pub fn duration_minutes(start: &NaiveDateTime, end: &NaiveDateTime) -> f64 {
    end.signed_duration_since(*start).num_seconds() as f64 / 60.0
}

/// Time-of-day / day-of-week bucket of a single event.
///
/// The numeric codes are part of the output contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimeBucket {
    WorkHours = 1,
    AfterHours = 2,
    Weekend = 3,
    WeekendAfterHours = 4,
}

impl TimeBucket {
    pub const ALL: [Self; 4] = [
        Self::WorkHours,
        Self::AfterHours,
        Self::Weekend,
        Self::WeekendAfterHours,
    ];

    /// Classify a timestamp. Working hours are `[work_start, work_end]` in
    /// minutes after midnight, both ends inclusive; Saturday and Sunday are
    /// the weekend.
    pub fn classify(dt: &NaiveDateTime, work_start_minute: u32, work_end_minute: u32) -> Self {
        let minute = dt.hour() * 60 + dt.minute();
        let after_hours = minute < work_start_minute || minute > work_end_minute;
        let weekend = matches!(dt.weekday(), Weekday::Sat | Weekday::Sun);

        match (weekend, after_hours) {
            (false, false) => Self::WorkHours,
            (false, true) => Self::AfterHours,
            (true, false) => Self::Weekend,
            (true, true) => Self::WeekendAfterHours,
        }
    }

    pub const fn code(self) -> u8 {
        self as u8
    }
}
