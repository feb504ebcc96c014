//! Command implementations.
//!
//! - [`extract`] - rebuild sessions for every week and write feature rows
//! - [`merge`] - concatenate week outputs after checking their headers
//! - [`schema`] - print the output column list

pub mod extract;
pub mod merge;
pub mod schema;
