//! Progress bar utilities using indicatif
//!
//! Wraps indicatif's `ProgressBar` so every command reports progress the
//! same way. The bar draws on stderr and is safe to share between rayon
//! workers.

use indicatif::{ProgressBar as IndicatifBar, ProgressStyle};

const TEMPLATE: &str = "{msg} [{bar:40.cyan/blue}] {percent:>3}% ({pos}/{len}) {elapsed_precise}";

/// Progress bar wrapper for displaying processing status
pub struct ProgressBar {
    bar: IndicatifBar,
}

impl ProgressBar {
    /// Create a new progress bar with known total
    pub fn new(total: usize, label: &str) -> Self {
        let style = ProgressStyle::default_bar()
            .template(TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█░");
        let bar = IndicatifBar::new(total as u64);
        bar.set_style(style);
        bar.set_message(label.to_string());

        Self { bar }
    }

    /// A bar that draws nothing; for tests and `--quiet` style callers.
    pub fn hidden() -> Self {
        Self {
            bar: IndicatifBar::hidden(),
        }
    }

    /// Increment progress by 1
    pub fn inc(&self) {
        self.bar.inc(1);
    }

    pub fn position(&self) -> usize {
        self.bar.position() as usize
    }

    /// Finish with custom message
    pub fn finish_with_message(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    /// Print a message above the progress bar without disturbing it
    pub fn println<S: AsRef<str>>(&self, msg: S) {
        if self.bar.is_hidden() {
            eprintln!("{}", msg.as_ref());
        } else {
            self.bar.println(msg.as_ref());
        }
    }
}
