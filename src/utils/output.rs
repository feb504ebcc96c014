//! Atomic CSV publishing.
//!
//! Rows go to a temporary file created next to the destination. Only
//! [`AtomicCsvWriter::commit`] renames it into place, so a failure or a
//! killed process never leaves a partial table at the destination path; the
//! temporary file is removed when the writer is dropped uncommitted.

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub struct AtomicCsvWriter {
    writer: csv::Writer<NamedTempFile>,
    target: PathBuf,
    rows: usize,
}

impl AtomicCsvWriter {
    /// Start a new table that will be published at `target`.
    pub fn create(target: impl AsRef<Path>) -> Result<Self> {
        let target = target.as_ref().to_path_buf();
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

        let temp = NamedTempFile::new_in(&dir).with_context(|| {
            format!("Failed to create temporary file in: {}", dir.display())
        })?;

        Ok(Self {
            writer: csv::Writer::from_writer(temp),
            target,
            rows: 0,
        })
    }

    pub fn write_record<I, T>(&mut self, record: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        self.writer
            .write_record(record)
            .with_context(|| format!("Failed to write row for {}", self.target.display()))?;
        self.rows += 1;
        Ok(())
    }

    /// Records written so far, header included.
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Flush, sync and move the table into place.
    pub fn commit(self) -> Result<PathBuf> {
        let Self {
            mut writer, target, ..
        } = self;

        writer
            .flush()
            .with_context(|| format!("Failed to flush {}", target.display()))?;
        let temp = writer
            .into_inner()
            .map_err(|e| anyhow!("Failed to finish {}: {}", target.display(), e.error()))?;
        temp.as_file()
            .sync_all()
            .with_context(|| format!("Failed to sync {}", target.display()))?;
        temp.persist(&target)
            .map_err(|e| anyhow!("Failed to publish {}: {}", target.display(), e.error))?;

        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_commit_publishes() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("nested").join("week_1.csv");

        let mut writer = AtomicCsvWriter::create(&target).unwrap();
        writer.write_record(["a", "b"]).unwrap();
        writer.write_record(["1", "2"]).unwrap();
        assert_eq!(writer.rows(), 2);
        assert!(!target.exists());

        writer.commit().unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "a,b\n1,2\n");
    }

    #[test]
    fn test_drop_without_commit_leaves_nothing() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("week_2.csv");

        {
            let mut writer = AtomicCsvWriter::create(&target).unwrap();
            writer.write_record(["a"]).unwrap();
        }

        assert!(!target.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_commit_replaces_existing() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("sessions.csv");
        fs::write(&target, "old\n").unwrap();

        let mut writer = AtomicCsvWriter::create(&target).unwrap();
        writer.write_record(["new"]).unwrap();
        writer.commit().unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "new\n");
    }
}
