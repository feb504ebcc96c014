//! Session reconstruction and feature aggregation.
//!
//! Control flow for one user in one week:
//!
//! ```text
//! sorted events --segmenter--> sessions --concurrency--> annotated sessions
//!     for each session: facet aggregator + timing + label --assembler--> row
//! ```
//!
//! - [`segmenter`] - splits the event stream into per-machine sessions
//! - [`concurrency`] - counts overlapping sessions
//! - [`facet`] - declarative statistical roll-ups over session members
//! - [`timing`] - session-level time-of-day and duration features
//! - [`label`] - insider label from malicious-event flags
//! - [`assembler`] - joins everything into a fixed-schema output row

pub mod assembler;
pub mod concurrency;
pub mod facet;
pub mod label;
pub mod segmenter;
pub mod timing;

use crate::activity::{ActivityCode, Event};
use crate::config::FeatureConfig;
use crate::roster::{MachineRelation, UserEntry};
use crate::utils::time::{day_index, TimeBucket};
use chrono::NaiveDateTime;

pub use assembler::{session_columns, Assembler, SessionRow};
pub use concurrency::annotate_concurrency;
pub use facet::{FacetAggregator, StatsMode};
pub use label::{resolve_label, resolve_session_label, LabelResolution};
pub use segmenter::{segment, SegmentError};
pub use timing::SessionTiming;

/// How a session began.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StartStatus {
    WithLogon = 1,
    /// First event was not a logon (e.g. the session began before the week)
    WithoutLogon = 2,
}

/// How a session was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndStatus {
    /// Still open when the week's events ran out
    Flushed = 0,
    WithLogoff = 1,
    /// A new logon on the same machine arrived before any logoff
    Interrupted = 2,
}

impl StartStatus {
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl EndStatus {
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// A contiguous span of one user's activity on one machine.
///
/// `members` index into the event slice the session was segmented from and
/// are in chronological order.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub machine: String,
    pub start_status: StartStatus,
    pub end_status: EndStatus,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    /// Sessions overlapping this one, itself included
    pub concurrency: usize,
    pub members: Vec<usize>,
}

/// What the segmenter needs to know about an event.
pub trait Timed {
    fn machine(&self) -> &str;
    fn activity(&self) -> ActivityCode;
    fn timestamp(&self) -> NaiveDateTime;
}

impl Timed for Event {
    fn machine(&self) -> &str {
        &self.pc
    }

    fn activity(&self) -> ActivityCode {
        self.activity
    }

    fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }
}

/// An event together with the per-event facts derived from the roster and
/// the calendar.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionEvent {
    pub event: Event,
    pub time_bucket: TimeBucket,
    pub day: i64,
    pub machine_relation: MachineRelation,
    pub malicious: bool,
    /// The user's scenario id, 0 for users with no insider record
    pub scenario: u32,
}

impl SessionEvent {
    pub fn enrich(event: Event, user: &UserEntry, config: &FeatureConfig) -> Self {
        let time_bucket = TimeBucket::classify(
            &event.timestamp,
            config.work_start_minute,
            config.work_end_minute,
        );
        Self {
            time_bucket,
            day: day_index(&event.timestamp, config.day_origin),
            machine_relation: user.machine_relation(&event.pc),
            malicious: user.is_malicious(&event.id),
            scenario: user.scenario(),
            event,
        }
    }
}

impl Timed for SessionEvent {
    fn machine(&self) -> &str {
        &self.event.pc
    }

    fn activity(&self) -> ActivityCode {
        self.event.activity
    }

    fn timestamp(&self) -> NaiveDateTime {
        self.event.timestamp
    }
}

/// One user's week after segmentation and concurrency annotation.
#[derive(Debug, Clone, Default)]
pub struct UserSessions {
    /// Enriched events in chronological order; session members index here
    pub events: Vec<SessionEvent>,
    /// Sessions in emission order
    pub sessions: Vec<Session>,
}

/// Run the per-user part of the pipeline: order, enrich, segment and count
/// concurrency.
///
/// Events are ordered by timestamp with the event id breaking ties, so the
/// result does not depend on the order the rows were read in.
pub fn reconstruct(
    user: &UserEntry,
    mut events: Vec<Event>,
    config: &FeatureConfig,
) -> Result<UserSessions, SegmentError> {
    events.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
    let events: Vec<SessionEvent> = events
        .into_iter()
        .map(|event| SessionEvent::enrich(event, user, config))
        .collect();

    let mut sessions = segment(&events)?;
    annotate_concurrency(&mut sessions);
    Ok(UserSessions { events, sessions })
}
