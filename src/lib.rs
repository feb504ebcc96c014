//! # Insider Session Features
//!
//! Batch tooling that turns weekly per-user activity logs (logon/logoff,
//! removable devices, email, web and file events) into one labeled,
//! fixed-width feature row per work session, ready for an insider-threat
//! classifier.
//!
//! ## Pipeline
//!
//! For every week, independently and in parallel:
//!
//! 1. Read the week's event table ([`activity::parser`]); bad rows are
//!    reported and dropped, a changed header fails the week.
//! 2. Group events by user and enrich them from the read-only
//!    [`roster::RosterSnapshot`] (time bucket, day, machine relation,
//!    malicious flag, scenario in force).
//! 3. Per user: segment into per-machine sessions, count concurrent
//!    sessions ([`session`]).
//! 4. Per session: facet statistics, timing, insider label, assembled
//!    into one row of a fixed schema.
//! 5. Publish `week_<n>.csv` atomically, then merge all successful weeks.
//!
//! ## Modules
//!
//! - [`activity`] - Event Table model and CSV reader
//! - [`roster`] - user attributes and insider ground truth
//! - [`session`] - segmentation, concurrency, facets, labels, assembly
//! - [`commands`] - `extract`, `merge`, `schema`
//! - [`config`] - tunable feature settings
//! - [`error`] - typed data-quality and schema errors
//! - [`utils`] - time helpers, compressed input, atomic output, parallelism
//!
//! ## Example Usage
//!
//! ```bash
//! # Extract all weeks, 8 worker threads, rejected rows to a side file
//! session-features extract weeks/*.csv.gz --roster roster.json \
//!     --output-dir out --jobs 8 --rejects out/rejects.csv
//!
//! # Full statistics per numeric field instead of means only
//! session-features extract weeks/*.csv --roster roster.json \
//!     --output-dir out --detailed-stats
//!
//! # Re-merge week outputs
//! session-features merge out/week_*.csv --output sessions.csv
//!
//! # Inspect the column layout
//! session-features schema --detailed-stats
//! ```

pub mod activity;
pub mod commands;
pub mod config;
pub mod error;
pub mod roster;
pub mod session;
pub mod utils;
