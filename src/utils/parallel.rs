//! Parallel fan-out over independent units of work.
//!
//! Each unit (one week file) runs on the rayon pool and produces its own
//! `Result`. A failing unit never aborts the others; the caller receives
//! every outcome in input order and decides how to report failures.

use crate::utils::progress::ProgressBar;
use anyhow::Result;
use rayon::prelude::*;

/// Outcome of one unit of work.
#[derive(Debug)]
pub struct UnitOutcome<'a, U, T> {
    pub unit: &'a U,
    pub result: Result<T>,
}

/// Run `work` over every unit in parallel, advancing `progress` once per
/// finished unit. Failures are logged above the bar as they happen.
pub fn run_isolated<'a, U, T, F>(
    units: &'a [U],
    progress: &ProgressBar,
    describe: impl Fn(&U) -> String + Sync,
    work: F,
) -> Vec<UnitOutcome<'a, U, T>>
where
    U: Sync,
    T: Send,
    F: Fn(&U) -> Result<T> + Sync + Send,
{
    units
        .par_iter()
        .map(|unit| {
            let result = work(unit);
            if let Err(err) = &result {
                progress.println(format!("[ERROR] {}: {:#}", describe(unit), err));
            }
            progress.inc();
            UnitOutcome { unit, result }
        })
        .collect()
}
