//! Immutable roster lookup shared by every week and user task.
//!
//! Built once from a [`RosterFile`]; all derived values (categorical codes,
//! supervisor machines, malicious id sets) are computed up front so the
//! snapshot can be read from many threads without locking.

use super::types::{RosterFile, UserProfile};
use crate::utils::time::parse_timestamp;
use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;

/// Categorical user attributes, in output column order.
pub const CATEGORICAL_COLUMNS: [&str; 5] = ["role", "b_unit", "f_unit", "dept", "team"];

const ADMIN_ROLE: &str = "ITAdmin";

/// How the machine an event happened on relates to the acting user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MachineRelation {
    Own = 0,
    Shared = 1,
    Other = 2,
    Supervisor = 3,
}

impl MachineRelation {
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// Insider answer key for one user.
#[derive(Debug, Clone)]
pub struct InsiderTruth {
    pub scenario: u32,
    pub window_start: NaiveDateTime,
    pub window_end: NaiveDateTime,
    pub malicious_ids: HashSet<String>,
}

impl InsiderTruth {
    /// Whether `ts` lies inside the inclusive malicious window.
    pub fn covers(&self, ts: &NaiveDateTime) -> bool {
        self.window_start <= *ts && *ts <= self.window_end
    }
}

#[derive(Debug, Clone)]
pub struct UserEntry {
    /// Position in the roster; used as the numeric user id in output rows
    pub index: usize,
    pub profile: UserProfile,
    /// Codes of [`CATEGORICAL_COLUMNS`]
    pub categorical: [u32; 5],
    pub is_admin: bool,
    pub supervisor_pc: Option<String>,
    pub insider: Option<InsiderTruth>,
}

impl UserEntry {
    pub fn id(&self) -> &str {
        &self.profile.user
    }

    pub fn machine_relation(&self, pc: &str) -> MachineRelation {
        if self.profile.pc.as_deref() == Some(pc) {
            MachineRelation::Own
        } else if self.profile.shared_pcs.iter().any(|p| p == pc) {
            MachineRelation::Shared
        } else if self.supervisor_pc.as_deref() == Some(pc) {
            MachineRelation::Supervisor
        } else {
            MachineRelation::Other
        }
    }

    pub fn is_malicious(&self, event_id: &str) -> bool {
        self.insider
            .as_ref()
            .is_some_and(|truth| truth.malicious_ids.contains(event_id))
    }

    /// The user's scenario id, 0 for users with no insider record. It does
    /// not depend on the event time, so a flagged event always carries it.
    pub fn scenario(&self) -> u32 {
        self.insider.as_ref().map_or(0, |truth| truth.scenario)
    }

    /// Flagged event ids whose timestamp falls outside the insider window.
    pub fn out_of_window<'a, I>(&self, events: I) -> Vec<&'a str>
    where
        I: IntoIterator<Item = (&'a str, &'a NaiveDateTime)>,
    {
        let Some(truth) = &self.insider else {
            return Vec::new();
        };
        events
            .into_iter()
            .filter(|(id, ts)| truth.malicious_ids.contains(*id) && !truth.covers(ts))
            .map(|(id, _)| id)
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RosterSnapshot {
    users: Vec<UserEntry>,
    by_id: HashMap<String, usize>,
}

impl RosterSnapshot {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read roster: {}", path.display()))?;
        let file: RosterFile = serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse roster: {}", path.display()))?;
        Self::build(file).with_context(|| format!("Invalid roster: {}", path.display()))
    }

    pub fn build(file: RosterFile) -> Result<Self> {
        let mut by_id = HashMap::with_capacity(file.users.len());
        for (idx, profile) in file.users.iter().enumerate() {
            if profile.user.trim().is_empty() {
                bail!("user #{} has an empty id", idx + 1);
            }
            if by_id.insert(profile.user.clone(), idx).is_some() {
                bail!("duplicate user '{}'", profile.user);
            }
        }

        // Each categorical value is coded by its rank among the distinct
        // values of that attribute.
        let codebooks: Vec<HashMap<&str, u32>> = (0..CATEGORICAL_COLUMNS.len())
            .map(|col| {
                let distinct: BTreeSet<&str> = file
                    .users
                    .iter()
                    .map(|u| categorical_value(u, col))
                    .collect();
                distinct
                    .into_iter()
                    .enumerate()
                    .map(|(code, value)| (value, code as u32))
                    .collect()
            })
            .collect();

        let mut insiders: HashMap<String, InsiderTruth> = HashMap::new();
        for record in &file.insiders {
            if !by_id.contains_key(&record.user) {
                bail!("insider record for unknown user '{}'", record.user);
            }
            if record.scenario == 0 {
                bail!("insider record for '{}' has scenario 0", record.user);
            }
            let window_start = parse_timestamp(&record.start)
                .with_context(|| format!("insider window start for '{}'", record.user))?;
            let window_end = parse_timestamp(&record.end)
                .with_context(|| format!("insider window end for '{}'", record.user))?;
            if window_start > window_end {
                bail!("insider window for '{}' ends before it starts", record.user);
            }
            let truth = InsiderTruth {
                scenario: record.scenario,
                window_start,
                window_end,
                malicious_ids: record.malicious_event_ids.iter().cloned().collect(),
            };
            if insiders.insert(record.user.clone(), truth).is_some() {
                bail!("more than one insider record for '{}'", record.user);
            }
        }

        let users = file
            .users
            .iter()
            .enumerate()
            .map(|(index, profile)| {
                let categorical =
                    std::array::from_fn(|col| codebooks[col][categorical_value(profile, col)]);
                let supervisor_pc = profile
                    .supervisor
                    .as_ref()
                    .and_then(|sup| by_id.get(sup))
                    .and_then(|&sup_idx| file.users[sup_idx].pc.clone());

                UserEntry {
                    index,
                    profile: profile.clone(),
                    categorical,
                    is_admin: profile.role == ADMIN_ROLE,
                    supervisor_pc,
                    insider: insiders.remove(&profile.user),
                }
            })
            .collect();

        Ok(Self { users, by_id })
    }

    pub fn get(&self, user: &str) -> Option<&UserEntry> {
        self.by_id.get(user).map(|&idx| &self.users[idx])
    }

    /// Users in roster order.
    pub fn users(&self) -> &[UserEntry] {
        &self.users
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn insider_count(&self) -> usize {
        self.users.iter().filter(|u| u.insider.is_some()).count()
    }
}

fn categorical_value(profile: &UserProfile, col: usize) -> &str {
    match col {
        0 => &profile.role,
        1 => &profile.b_unit,
        2 => &profile.f_unit,
        3 => &profile.dept,
        _ => &profile.team,
    }
}
