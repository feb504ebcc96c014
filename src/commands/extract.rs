//! Weekly session feature extraction.
//!
//! Reads one event table per week, rebuilds every user's sessions and
//! writes one feature row per session. Weeks run in parallel and are
//! isolated from each other: a week that fails (schema drift, I/O, id
//! overflow) is reported by number while the others are still published.
//!
//! # Usage
//!
//! ```bash
//! session-features extract weeks/*.csv.gz --roster roster.json --output-dir out
//! session-features extract weeks/12.csv --roster roster.json --output-dir out \
//!     --detailed-stats --rejects out/rejects.csv
//! ```
//!
//! # Output
//!
//! - `<output-dir>/week_<n>.csv` for every successful week
//! - the merged table of all successful weeks, in week order
//!   (`<output-dir>/sessions.csv` unless `--output` is given)
//! - optionally a CSV of every rejected input record

use crate::activity::parser::{read_week_table, week_from_path, WeekTable};
use crate::activity::Event;
use crate::commands::merge::merge_tables;
use crate::config::FeatureConfig;
use crate::error::{RecordError, RecordIssue};
use crate::roster::RosterSnapshot;
use crate::session::{
    reconstruct, session_columns, Assembler, FacetAggregator, StatsMode, UserSessions,
};
use crate::utils::format::{format_number, format_percent, format_weeks};
use crate::utils::output::AtomicCsvWriter;
use crate::utils::parallel::run_isolated;
use crate::utils::progress::ProgressBar;
use anyhow::{bail, Context, Result};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Data-quality issues printed per week; the rest only go to `--rejects`.
const ISSUES_SHOWN: usize = 10;

/// Everything `extract` needs besides the week files.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub roster: PathBuf,
    pub output_dir: PathBuf,
    /// Merged table; defaults to `<output_dir>/sessions.csv`
    pub output: Option<PathBuf>,
    pub rejects: Option<PathBuf>,
    pub config: FeatureConfig,
    /// Draw a progress bar on stderr
    pub progress: bool,
}

impl ExtractOptions {
    pub fn new(roster: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            roster: roster.into(),
            output_dir: output_dir.into(),
            output: None,
            rejects: None,
            config: FeatureConfig::default(),
            progress: false,
        }
    }

    fn merged_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.output_dir.join("sessions.csv"))
    }
}

/// One week file scheduled for processing.
#[derive(Debug, Clone)]
pub struct WeekJob {
    pub week: u32,
    pub path: PathBuf,
}

/// What happened to one successful week.
#[derive(Debug, Clone, Default)]
pub struct WeekReport {
    pub week: u32,
    pub output: PathBuf,
    /// Data rows in the input table, rejected ones included
    pub rows_read: usize,
    pub events: usize,
    pub users: usize,
    pub sessions: usize,
    pub insider_sessions: usize,
    pub ambiguous_sessions: usize,
    pub issues: Vec<RecordIssue>,
    pub warnings: Vec<String>,
}

/// Result of a whole extraction run.
#[derive(Debug, Default)]
pub struct ExtractSummary {
    /// Successful weeks in week order
    pub reports: Vec<WeekReport>,
    /// Failed weeks with the reason, in week order
    pub failures: Vec<(u32, String)>,
    /// The merged table, when at least one week succeeded
    pub merged: Option<PathBuf>,
    pub merged_rows: usize,
    pub rejects: Option<PathBuf>,
}

impl ExtractSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn sessions(&self) -> usize {
        self.reports.iter().map(|r| r.sessions).sum()
    }

    pub fn issues(&self) -> usize {
        self.reports.iter().map(|r| r.issues.len()).sum()
    }
}

/// Resolve week numbers from file names. Two files claiming the same week
/// would overwrite each other's output, so that is an error up front.
pub fn plan_weeks(week_files: &[PathBuf]) -> Result<Vec<WeekJob>> {
    if week_files.is_empty() {
        bail!("No week files provided");
    }

    let mut seen: HashMap<u32, &Path> = HashMap::new();
    let mut jobs = Vec::with_capacity(week_files.len());
    for path in week_files {
        let week = week_from_path(path)?;
        if let Some(previous) = seen.insert(week, path) {
            bail!(
                "Week {} appears twice: {} and {}",
                week,
                previous.display(),
                path.display()
            );
        }
        jobs.push(WeekJob {
            week,
            path: path.clone(),
        });
    }
    jobs.sort_by_key(|job| job.week);
    Ok(jobs)
}

/// Split a week's events by roster user. Events of users missing from the
/// roster become data-quality issues.
fn group_by_user(
    table: WeekTable,
    roster: &RosterSnapshot,
) -> (Vec<Vec<Event>>, Vec<RecordIssue>) {
    let WeekTable {
        events,
        lines,
        mut issues,
        ..
    } = table;

    let mut per_user: Vec<Vec<Event>> = vec![Vec::new(); roster.len()];
    for (event, line) in events.into_iter().zip(lines) {
        match roster.get(&event.user) {
            Some(entry) => per_user[entry.index].push(event),
            None => issues.push(RecordIssue {
                line,
                event_id: Some(event.id.clone()),
                error: RecordError::UnknownUser(event.user),
            }),
        }
    }
    issues.sort_by_key(|issue| issue.line);
    (per_user, issues)
}

/// Run the full pipeline for one week and publish `week_<n>.csv`.
pub fn process_week(
    job: &WeekJob,
    roster: &RosterSnapshot,
    config: &FeatureConfig,
    aggregator: &FacetAggregator,
    output_dir: &Path,
) -> Result<WeekReport> {
    let table = read_week_table(&job.path)?;
    let rows_read = table.rows;
    let (per_user, issues) = group_by_user(table, roster);
    let events = per_user.iter().map(Vec::len).sum();

    // Users are independent; ids are handed out afterwards in roster order.
    let users = roster.users();
    let rebuilt: Vec<(usize, UserSessions)> = per_user
        .into_par_iter()
        .enumerate()
        .filter(|(_, events)| !events.is_empty())
        .map(|(idx, events)| {
            let user = &users[idx];
            reconstruct(user, events, config)
                .map(|sessions| (idx, sessions))
                .with_context(|| format!("Failed to rebuild sessions of user {}", user.id()))
        })
        .collect::<Result<_>>()?;

    let sessions: usize = rebuilt.iter().map(|(_, s)| s.sessions.len()).sum();
    if sessions as u64 >= config.session_id_stride {
        bail!(
            "{} sessions do not fit the session id stride {}",
            format_number(sessions),
            config.session_id_stride
        );
    }
    let base = u64::from(job.week)
        .checked_mul(config.session_id_stride)
        .with_context(|| format!("Session ids of week {} overflow", job.week))?;

    let target = output_dir.join(format!("week_{}.csv", job.week));
    let mut writer = AtomicCsvWriter::create(&target)?;
    writer.write_record(session_columns(aggregator))?;

    let assembler = Assembler::new(aggregator, job.week);
    let mut report = WeekReport {
        week: job.week,
        rows_read,
        events,
        users: rebuilt.len(),
        sessions,
        issues,
        ..WeekReport::default()
    };

    let mut next_id = base;
    for (idx, user_sessions) in &rebuilt {
        let user = &users[*idx];
        let stray = user.out_of_window(
            user_sessions
                .events
                .iter()
                .map(|e| (e.event.id.as_str(), &e.event.timestamp)),
        );
        if !stray.is_empty() {
            report.warnings.push(format!(
                "user {} has {} malicious events outside the insider window: {}",
                user.id(),
                stray.len(),
                stray.join(", ")
            ));
        }
        for row in assembler.assemble_user(user, user_sessions, next_id) {
            if row.label.label != 0 {
                report.insider_sessions += 1;
            }
            // Only reachable if the roster ever allows more than one
            // scenario per user; today every member carries the same id.
            if row.label.is_ambiguous() {
                report.ambiguous_sessions += 1;
                report.warnings.push(format!(
                    "session {} of user {} matches scenarios {:?}, labeled {}",
                    row.session_id,
                    user.id(),
                    row.label.candidates,
                    row.label.label
                ));
            }
            writer.write_record(row.to_record())?;
        }
        next_id += user_sessions.sessions.len() as u64;
    }

    report.output = writer.commit()?;
    Ok(report)
}

fn write_rejects(path: &Path, reports: &[WeekReport]) -> Result<PathBuf> {
    let mut writer = AtomicCsvWriter::create(path)?;
    writer.write_record(["week", "line", "event_id", "error"])?;
    for report in reports {
        for issue in &report.issues {
            writer.write_record([
                report.week.to_string(),
                issue.line.to_string(),
                issue.event_id.clone().unwrap_or_default(),
                issue.error.to_string(),
            ])?;
        }
    }
    writer.commit()
}

/// Run every week, publish what succeeded and merge it. Week failures are
/// collected in the summary; only setup problems (roster, output paths)
/// return an error.
pub fn extract(week_files: &[PathBuf], options: &ExtractOptions) -> Result<ExtractSummary> {
    options.config.validate()?;
    let jobs = plan_weeks(week_files)?;
    let roster = RosterSnapshot::load(&options.roster)?;
    let aggregator = FacetAggregator::sessions(StatsMode::from_detailed(
        options.config.detailed_stats,
    ));

    eprintln!(
        "Loaded roster: {} users ({} insiders)",
        format_number(roster.len()),
        format_number(roster.insider_count())
    );
    eprintln!(
        "Processing {} weeks ({} feature columns)...",
        jobs.len(),
        format_number(session_columns(&aggregator).len())
    );

    let progress = if options.progress {
        ProgressBar::new(jobs.len(), "Weeks")
    } else {
        ProgressBar::hidden()
    };

    let outcomes = run_isolated(
        &jobs,
        &progress,
        |job| format!("Week {} ({})", job.week, job.path.display()),
        |job| process_week(job, &roster, &options.config, &aggregator, &options.output_dir),
    );

    let mut summary = ExtractSummary::default();
    for outcome in outcomes {
        match outcome.result {
            Ok(report) => summary.reports.push(report),
            Err(err) => summary.failures.push((outcome.unit.week, format!("{err:#}"))),
        }
    }
    progress.finish_with_message(&format!(
        "{} of {} weeks done",
        summary.reports.len(),
        jobs.len()
    ));

    for report in &summary.reports {
        for warning in &report.warnings {
            eprintln!("[WARN] Week {}: {}", report.week, warning);
        }
        for issue in report.issues.iter().take(ISSUES_SHOWN) {
            eprintln!(
                "[WARN] Week {} line {}: {}",
                report.week, issue.line, issue.error
            );
        }
        if report.issues.len() > ISSUES_SHOWN {
            eprintln!(
                "[WARN] Week {}: {} more rejected records",
                report.week,
                format_number(report.issues.len() - ISSUES_SHOWN)
            );
        }
    }

    if let Some(path) = &options.rejects {
        summary.rejects = Some(write_rejects(path, &summary.reports)?);
    }

    if !summary.reports.is_empty() {
        let tables: Vec<PathBuf> = summary.reports.iter().map(|r| r.output.clone()).collect();
        let merged = options.merged_path();
        summary.merged_rows = merge_tables(&tables, &merged)
            .with_context(|| format!("Failed to merge week outputs into {}", merged.display()))?;
        summary.merged = Some(merged);
    }

    Ok(summary)
}

fn print_summary(summary: &ExtractSummary) {
    println!("{}", "=".repeat(100));
    println!(
        "{:<8} {:>12} {:>12} {:>8} {:>12} {:>10} {:>10} {:>10}",
        "Week", "Rows", "Events", "Users", "Sessions", "Insider", "Ambiguous", "Rejected"
    );
    println!("{}", "=".repeat(100));

    for report in &summary.reports {
        println!(
            "{:<8} {:>12} {:>12} {:>8} {:>12} {:>10} {:>10} {:>10}",
            report.week,
            format_number(report.rows_read),
            format_number(report.events),
            format_number(report.users),
            format_number(report.sessions),
            format_number(report.insider_sessions),
            format_number(report.ambiguous_sessions),
            format_number(report.issues.len()),
        );
    }
    for (week, _) in &summary.failures {
        println!("{:<8} {:>12}", week, "FAILED");
    }

    println!("{}", "=".repeat(100));
    let rows: usize = summary.reports.iter().map(|r| r.rows_read).sum();
    println!(
        "Sessions: {}    Rejected records: {} ({} of rows)",
        format_number(summary.sessions()),
        format_number(summary.issues()),
        format_percent(summary.issues(), rows)
    );
}

pub fn run(week_files: &[String], options: &ExtractOptions) -> Result<()> {
    let files: Vec<PathBuf> = week_files.iter().map(PathBuf::from).collect();
    let summary = extract(&files, options)?;

    print_summary(&summary);

    if let Some(path) = &summary.merged {
        eprintln!(
            "\n✓ {} sessions written to: {}",
            format_number(summary.merged_rows),
            path.display()
        );
    }
    if let Some(path) = &summary.rejects {
        eprintln!("✓ Rejected records written to: {}", path.display());
    }

    if !summary.is_success() {
        for (week, reason) in &summary.failures {
            eprintln!("[ERROR] Week {}: {}", week, reason);
        }
        let weeks: Vec<u32> = summary.failures.iter().map(|(w, _)| *w).collect();
        if summary.merged.is_some() {
            eprintln!(
                "[WARN] Merged table is missing weeks {}",
                format_weeks(&weeks)
            );
        }
        bail!(
            "{} of {} weeks failed: {}",
            summary.failures.len(),
            summary.failures.len() + summary.reports.len(),
            format_weeks(&weeks)
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_weeks_sorts_and_rejects_duplicates() {
        let files = vec![
            PathBuf::from("in/12.csv"),
            PathBuf::from("in/3_num.csv.gz"),
        ];
        let jobs = plan_weeks(&files).unwrap();
        assert_eq!(jobs.iter().map(|j| j.week).collect::<Vec<_>>(), vec![3, 12]);

        let dupes = vec![PathBuf::from("a/7.csv"), PathBuf::from("b/week_7.csv")];
        let err = plan_weeks(&dupes).unwrap_err();
        assert!(err.to_string().contains("Week 7 appears twice"));

        assert!(plan_weeks(&[]).is_err());
        assert!(plan_weeks(&[PathBuf::from("notes.csv")]).is_err());
    }
}
