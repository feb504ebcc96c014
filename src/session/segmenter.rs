//! Session segmentation.
//!
//! Walks one user's chronologically sorted events and keeps at most one
//! open session per machine:
//!
//! | open session on machine? | event   | effect                                          |
//! |--------------------------|---------|-------------------------------------------------|
//! | no                       | Logoff  | one-event session, closed with logoff           |
//! | no                       | other   | open; with-logon iff the event is a Logon       |
//! | yes                      | Logoff  | append, close with logoff                       |
//! | yes                      | Logon   | close as interrupted, open a new one with it    |
//! | yes                      | other   | append                                          |
//!
//! Sessions still open at the end are flushed in the order they were
//! opened. Emission order (close order) is the order session ids follow.

use super::{EndStatus, Session, StartStatus, Timed};
use crate::activity::ActivityCode;
use chrono::NaiveDateTime;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SegmentError {
    #[error("event #{index} at {at} precedes the event before it")]
    Unsorted { index: usize, at: NaiveDateTime },
}

struct OpenSession {
    opened: usize,
    session: Session,
}

/// Incremental segmenter; feed events with [`push`](Self::push), then
/// [`finish`](Self::finish).
#[derive(Default)]
pub struct Segmenter {
    open: HashMap<String, OpenSession>,
    closed: Vec<Session>,
    opened: usize,
    last: Option<NaiveDateTime>,
}

impl Segmenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the event at position `index` of the user's event slice.
    pub fn push<E: Timed>(&mut self, index: usize, event: &E) -> Result<(), SegmentError> {
        let ts = event.timestamp();
        if self.last.is_some_and(|last| ts < last) {
            return Err(SegmentError::Unsorted { index, at: ts });
        }
        self.last = Some(ts);

        let machine = event.machine();
        let activity = event.activity();

        let Some(current) = self.open.get_mut(machine) else {
            let session = Self::start(machine, index, ts, activity);
            if activity == ActivityCode::Logoff {
                self.close(session, EndStatus::WithLogoff);
            } else {
                self.track(session);
            }
            return Ok(());
        };

        match activity {
            ActivityCode::Logoff => {
                current.session.members.push(index);
                current.session.end_time = ts;
                if let Some(done) = self.open.remove(machine) {
                    self.close(done.session, EndStatus::WithLogoff);
                }
            }
            ActivityCode::Logon => {
                if let Some(done) = self.open.remove(machine) {
                    self.close(done.session, EndStatus::Interrupted);
                }
                let session = Self::start(machine, index, ts, activity);
                self.track(session);
            }
            _ => {
                current.session.members.push(index);
                current.session.end_time = ts;
            }
        }
        Ok(())
    }

    /// Flush every open session and return all sessions in emission order.
    pub fn finish(mut self) -> Vec<Session> {
        let mut remaining: Vec<OpenSession> = self.open.drain().map(|(_, open)| open).collect();
        remaining.sort_by_key(|open| open.opened);
        for open in remaining {
            self.close(open.session, EndStatus::Flushed);
        }
        self.closed
    }

    fn start(machine: &str, index: usize, ts: NaiveDateTime, activity: ActivityCode) -> Session {
        let start_status = if activity == ActivityCode::Logon {
            StartStatus::WithLogon
        } else {
            StartStatus::WithoutLogon
        };
        Session {
            machine: machine.to_string(),
            start_status,
            end_status: EndStatus::Flushed,
            start_time: ts,
            end_time: ts,
            concurrency: 1,
            members: vec![index],
        }
    }

    fn track(&mut self, session: Session) {
        let opened = self.opened;
        self.opened += 1;
        self.open
            .insert(session.machine.clone(), OpenSession { opened, session });
    }

    fn close(&mut self, mut session: Session, status: EndStatus) {
        session.end_status = status;
        self.closed.push(session);
    }
}

/// Segment a user's sorted events into sessions.
pub fn segment<E: Timed>(events: &[E]) -> Result<Vec<Session>, SegmentError> {
    let mut segmenter = Segmenter::new();
    for (index, event) in events.iter().enumerate() {
        segmenter.push(index, event)?;
    }
    Ok(segmenter.finish())
}
