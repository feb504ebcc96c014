//! Session feature vector assembly.
//!
//! Joins the segmenter output, the concurrency annotation, the user's
//! static attributes, the facet vector and the label into one row of the
//! fixed output schema.

use super::facet::FacetAggregator;
use super::label::{resolve_session_label, LabelResolution};
use super::timing::SessionTiming;
use super::{Session, SessionEvent, UserSessions};
use crate::activity::Event;
use crate::roster::{UserEntry, CATEGORICAL_COLUMNS};
use crate::utils::time::TimeBucket;

/// Session identity, timing and status columns.
pub const SESSION_COLUMNS: [&str; 18] = [
    "starttime",
    "endtime",
    "user",
    "sessionid",
    "day",
    "week",
    "pc",
    "isworkhour",
    "isafterhour",
    "isweekend",
    "isweekendafterhour",
    "n_days",
    "duration",
    "n_concurrent_sessions",
    "start_with",
    "end_with",
    "ses_start",
    "ses_end",
];

/// Static user attribute columns following the categorical codes.
pub const PROFILE_COLUMNS: [&str; 6] = ["ITAdmin", "O", "C", "E", "A", "N"];

pub const LABEL_COLUMN: &str = "insider";

/// Full output header for an aggregator's facet layout.
pub fn session_columns(aggregator: &FacetAggregator) -> Vec<String> {
    SESSION_COLUMNS
        .iter()
        .chain(CATEGORICAL_COLUMNS.iter())
        .chain(PROFILE_COLUMNS.iter())
        .map(|c| (*c).to_string())
        .chain(aggregator.feature_names().iter().cloned())
        .chain(std::iter::once(LABEL_COLUMN.to_string()))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionRow {
    pub session_id: u64,
    pub values: Vec<f64>,
    pub label: LabelResolution,
}

impl SessionRow {
    /// CSV cells; floats use shortest round-trip formatting.
    pub fn to_record(&self) -> Vec<String> {
        self.values.iter().map(f64::to_string).collect()
    }
}

/// Builds output rows for one week.
pub struct Assembler<'a> {
    aggregator: &'a FacetAggregator,
    week: u32,
}

impl<'a> Assembler<'a> {
    pub const fn new(aggregator: &'a FacetAggregator, week: u32) -> Self {
        Self { aggregator, week }
    }

    /// Number of columns in every row.
    pub fn width(&self) -> usize {
        SESSION_COLUMNS.len()
            + CATEGORICAL_COLUMNS.len()
            + PROFILE_COLUMNS.len()
            + self.aggregator.width()
            + 1
    }

    /// Row for one session. `None` only for a session without members,
    /// which segmentation never produces.
    pub fn assemble(
        &self,
        user: &UserEntry,
        session_id: u64,
        session: &Session,
        events: &[SessionEvent],
    ) -> Option<SessionRow> {
        let members: Vec<&SessionEvent> = session
            .members
            .iter()
            .filter_map(|&idx| events.get(idx))
            .collect();
        let timing = SessionTiming::from_members(&members)?;
        let first = members.first()?;

        let mut values = Vec::with_capacity(self.width());
        values.extend([
            timing.start_epoch as f64,
            timing.end_epoch as f64,
            user.index as f64,
            session_id as f64,
            timing.day as f64,
            f64::from(self.week),
            f64::from(first.machine_relation.code()),
        ]);
        values.extend(TimeBucket::ALL.iter().map(|&b| timing.fraction(b)));
        values.extend([
            timing.n_days as f64,
            timing.duration_minutes,
            session.concurrency as f64,
            f64::from(session.start_status.code()),
            f64::from(session.end_status.code()),
            timing.start_hours,
            timing.end_hours,
        ]);

        values.extend(user.categorical.iter().map(|&c| f64::from(c)));
        values.push(if user.is_admin { 1.0 } else { 0.0 });
        values.extend(user.profile.personality.scores());

        let plain: Vec<&Event> = members.iter().map(|m| &m.event).collect();
        values.extend(self.aggregator.aggregate(&plain));

        let label = resolve_session_label(&members);
        values.push(f64::from(label.label));

        Some(SessionRow {
            session_id,
            values,
            label,
        })
    }

    /// Rows for all of a user's sessions, ids counting up from `first_id`
    /// in emission order.
    pub fn assemble_user(
        &self,
        user: &UserEntry,
        sessions: &UserSessions,
        first_id: u64,
    ) -> Vec<SessionRow> {
        sessions
            .sessions
            .iter()
            .zip(first_id..)
            .filter_map(|(session, id)| self.assemble(user, id, session, &sessions.events))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::{ActivityCode, Attribute};
    use crate::config::FeatureConfig;
    use crate::roster::{RosterFile, RosterSnapshot};
    use crate::session::{reconstruct, StatsMode};
    use crate::utils::time::parse_timestamp;

    fn roster() -> RosterSnapshot {
        let json = r#"{
            "users": [
                {"user": "U0", "role": "Engineer", "b_unit": "1", "f_unit": "R",
                 "dept": "D", "team": "T", "pc": "PC-0",
                 "personality": {"o": 1, "c": 2, "e": 3, "a": 4, "n": 5}},
                {"user": "U1", "role": "ITAdmin", "b_unit": "2", "f_unit": "R",
                 "dept": "D", "team": "T", "pc": "PC-1",
                 "personality": {"o": 10, "c": 20, "e": 30, "a": 40, "n": 50}}
            ]
        }"#;
        let file: RosterFile = serde_json::from_str(json).unwrap();
        RosterSnapshot::build(file).unwrap()
    }

    fn ev(id: &str, time: &str, activity: ActivityCode) -> Event {
        Event::new(id, "U1", "PC-1", parse_timestamp(time).unwrap(), activity)
    }

    #[test]
    fn test_header_layout() {
        let agg = FacetAggregator::sessions(StatsMode::Fast);
        let header = session_columns(&agg);
        let assembler = Assembler::new(&agg, 1);
        assert_eq!(header.len(), assembler.width());
        assert_eq!(header[0], "starttime");
        assert_eq!(header[17], "ses_end");
        assert_eq!(&header[18..23], &["role", "b_unit", "f_unit", "dept", "team"]);
        assert_eq!(&header[23..29], &["ITAdmin", "O", "C", "E", "A", "N"]);
        assert_eq!(header[29], "n_allact");
        assert_eq!(header.last().unwrap(), "insider");
    }

    #[test]
    fn test_logon_file_logoff_row() {
        let roster = roster();
        let user = roster.get("U1").unwrap();
        let config = FeatureConfig::default();
        let events = vec![
            ev("a", "01/04/2010 08:00:00", ActivityCode::Logon),
            ev("b", "01/04/2010 08:10:00", ActivityCode::File)
                .with_attribute(Attribute::FileLen, 12.0),
            ev("c", "01/04/2010 09:00:00", ActivityCode::Logoff),
        ];
        let sessions = reconstruct(user, events, &config).unwrap();
        let agg = FacetAggregator::sessions(StatsMode::Fast);
        let header = session_columns(&agg);
        let rows = Assembler::new(&agg, 2).assemble_user(user, &sessions, 200_000);
        assert_eq!(rows.len(), 1);

        let row = &rows[0];
        assert_eq!(row.values.len(), header.len());
        let get = |name: &str| row.values[header.iter().position(|h| h == name).unwrap()];

        assert_eq!(get("user"), 1.0);
        assert_eq!(get("sessionid"), 200_000.0);
        assert_eq!(get("week"), 2.0);
        assert_eq!(get("day"), 7.0);
        assert_eq!(get("pc"), 0.0);
        assert_eq!(get("duration"), 60.0);
        assert_eq!(get("start_with"), 1.0);
        assert_eq!(get("end_with"), 1.0);
        assert_eq!(get("n_concurrent_sessions"), 1.0);
        assert_eq!(get("isworkhour"), 1.0);
        assert_eq!(get("ses_start"), 8.0);
        assert_eq!(get("ses_end"), 9.0);
        assert_eq!(get("ITAdmin"), 1.0);
        assert_eq!(get("role"), 1.0);
        assert_eq!(get("b_unit"), 1.0);
        assert_eq!(get("N"), 50.0);
        assert_eq!(get("n_allact"), 3.0);
        assert_eq!(get("n_file"), 1.0);
        assert_eq!(get("file_mean_file_len"), 12.0);
        assert_eq!(get("n_email"), 0.0);
        assert_eq!(get("n_http"), 0.0);
        assert_eq!(get("n_usb"), 0.0);
        assert_eq!(get("insider"), 0.0);

        let record = row.to_record();
        assert_eq!(record[3], "200000");
        assert_eq!(record[16], "8");
    }
}
