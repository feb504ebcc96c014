//! Serialized roster layout.
//!
//! The roster is produced by an external step (organizational directory,
//! psychometric scores, PC assignment, insider answer key) and arrives as a
//! single JSON document:
//!
//! ```json
//! {
//!   "users": [
//!     {"user": "ACM2278", "role": "ITAdmin", "b_unit": "1",
//!      "f_unit": "Research", "dept": "Software", "team": "3",
//!      "supervisor": "CDE1846", "pc": "PC-1234", "shared_pcs": [],
//!      "personality": {"o": 40, "c": 39, "e": 36, "a": 19, "n": 40}}
//!   ],
//!   "insiders": [
//!     {"user": "ACM2278", "scenario": 1,
//!      "start": "08/18/2010 21:35:00", "end": "08/19/2010 05:00:00",
//!      "malicious_event_ids": ["{L9G8-J9QE34VM-2834VDPB}"]}
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RosterFile {
    pub users: Vec<UserProfile>,
    #[serde(default)]
    pub insiders: Vec<InsiderRecord>,
}

/// Static attributes of one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user: String,
    pub role: String,
    pub b_unit: String,
    pub f_unit: String,
    pub dept: String,
    pub team: String,
    /// User id of the supervisor
    #[serde(default)]
    pub supervisor: Option<String>,
    /// The user's own machine
    #[serde(default)]
    pub pc: Option<String>,
    /// Machines the user shares with others
    #[serde(default)]
    pub shared_pcs: Vec<String>,
    pub personality: Personality,
}

/// Big Five (OCEAN) psychometric scores.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Personality {
    #[serde(alias = "O")]
    pub o: f64,
    #[serde(alias = "C")]
    pub c: f64,
    #[serde(alias = "E")]
    pub e: f64,
    #[serde(alias = "A")]
    pub a: f64,
    #[serde(alias = "N")]
    pub n: f64,
}

impl Personality {
    pub const fn scores(&self) -> [f64; 5] {
        [self.o, self.c, self.e, self.a, self.n]
    }
}

/// Ground truth for one malicious user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsiderRecord {
    pub user: String,
    pub scenario: u32,
    /// Start of the malicious window (any accepted event timestamp layout)
    pub start: String,
    /// End of the malicious window, inclusive
    pub end: String,
    #[serde(default)]
    pub malicious_event_ids: Vec<String>,
}
