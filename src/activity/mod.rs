//! Event Table: the normalized per-week activity records.
//!
//! - [`types`] - [`Event`], activity codes and numeric attributes
//! - [`parser`] - reading week tables from CSV with schema validation
//!
//! Week tables are produced by an upstream splitting step; this module only
//! reads them.

pub mod parser;
pub mod types;

pub use types::{ActivityCode, Attribute, Event, EventAttributes};
