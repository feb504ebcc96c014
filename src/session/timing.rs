//! Session-level scalar features computed once per session.

use super::SessionEvent;
use crate::utils::time::{clock_hours, duration_minutes, epoch_seconds, TimeBucket};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionTiming {
    /// Epoch seconds of the first and last member
    pub start_epoch: i64,
    pub end_epoch: i64,
    /// Day index of the first member
    pub day: i64,
    /// Fraction of members per [`TimeBucket`], in `TimeBucket::ALL` order
    pub bucket_fractions: [f64; 4],
    pub n_days: usize,
    pub duration_minutes: f64,
    /// Clock time of the first and last member as fractional hours
    pub start_hours: f64,
    pub end_hours: f64,
}

impl SessionTiming {
    /// Timing of a session from its chronologically ordered members.
    /// Returns `None` for an empty member list.
    pub fn from_members(members: &[&SessionEvent]) -> Option<Self> {
        let first = members.first()?;
        let last = members.last()?;
        let start = first.event.timestamp;
        let end = last.event.timestamp;

        let mut counts = [0usize; 4];
        for member in members {
            counts[member.time_bucket as usize - 1] += 1;
        }
        let total = members.len() as f64;
        let bucket_fractions = counts.map(|c| c as f64 / total);

        let n_days = members.iter().map(|m| m.day).collect::<BTreeSet<_>>().len();

        Some(Self {
            start_epoch: epoch_seconds(&start),
            end_epoch: epoch_seconds(&end),
            day: first.day,
            bucket_fractions,
            n_days,
            duration_minutes: duration_minutes(&start, &end),
            start_hours: clock_hours(&start),
            end_hours: clock_hours(&end),
        })
    }

    pub fn fraction(&self, bucket: TimeBucket) -> f64 {
        self.bucket_fractions[bucket as usize - 1]
    }
}
