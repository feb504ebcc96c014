//! Feature extraction settings.
//!
//! Defaults reproduce the reference dataset layout (CERT r4.2 style logs).
//! A JSON file passed with `--config` may override any subset of fields;
//! command-line flags are applied on top of that.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeatureConfig {
    /// Emit min/max/median/mean/std per numeric field instead of mean only
    pub detailed_stats: bool,
    /// First minute of the working day (07:30)
    pub work_start_minute: u32,
    /// Last minute of the working day, inclusive (17:30)
    pub work_end_minute: u32,
    /// Monday that day indices count from
    pub day_origin: NaiveDate,
    /// Session ids are `week * stride + sequence`
    pub session_id_stride: u64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            detailed_stats: false,
            work_start_minute: 7 * 60 + 30,
            work_end_minute: 17 * 60 + 30,
            day_origin: NaiveDate::from_ymd_opt(2009, 12, 28).unwrap_or(NaiveDate::MIN),
            session_id_stride: 100_000,
        }
    }
}

impl FeatureConfig {
    /// Load overrides from a JSON file. Unlike a missing `--config` flag, a
    /// file that exists but does not parse is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.work_start_minute >= 24 * 60 || self.work_end_minute >= 24 * 60 {
            anyhow::bail!("work hours must lie within a day (minutes 0..1440)");
        }
        if self.work_start_minute > self.work_end_minute {
            anyhow::bail!(
                "work_start_minute ({}) is after work_end_minute ({})",
                self.work_start_minute,
                self.work_end_minute
            );
        }
        if self.session_id_stride == 0 {
            anyhow::bail!("session_id_stride must be positive");
        }
        Ok(())
    }
}
