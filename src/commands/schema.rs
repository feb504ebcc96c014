//! Print the output column list.
//!
//! Handy for checking a downstream model against the feature layout
//! without running an extraction.
//!
//! ```bash
//! session-features schema
//! session-features schema --detailed-stats
//! ```

use crate::session::{session_columns, FacetAggregator, StatsMode};
use anyhow::Result;

pub fn columns(detailed: bool) -> Vec<String> {
    session_columns(&FacetAggregator::sessions(StatsMode::from_detailed(detailed)))
}

pub fn run(detailed: bool) -> Result<()> {
    let columns = columns(detailed);
    for (idx, name) in columns.iter().enumerate() {
        println!("{:>4}  {}", idx, name);
    }
    eprintln!("\n{} columns", columns.len());
    Ok(())
}
