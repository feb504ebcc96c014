//! Read-only user roster and insider ground truth.
//!
//! - [`types`] - JSON layout of the roster file
//! - [`snapshot`] - the immutable lookup consumed by the session pipeline

pub mod snapshot;
pub mod types;

pub use snapshot::{
    InsiderTruth, MachineRelation, RosterSnapshot, UserEntry, CATEGORICAL_COLUMNS,
};
pub use types::{InsiderRecord, Personality, RosterFile, UserProfile};
