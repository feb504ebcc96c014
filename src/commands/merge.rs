//! Schema-checked concatenation of week outputs.
//!
//! Week tables are produced independently, so before rows from different
//! weeks end up in one table their headers are compared column by column.
//! Any difference fails the merge and nothing is published.
//!
//! # Usage
//!
//! ```bash
//! session-features merge out/week_1.csv out/week_2.csv --output sessions.csv
//! ```

use crate::error::SchemaError;
use crate::utils::format::format_number;
use crate::utils::output::AtomicCsvWriter;
use crate::utils::reader::open_file;
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

/// Concatenate `inputs` into `output`, keeping the first header once.
/// Returns the number of data rows written.
pub fn merge_tables(inputs: &[PathBuf], output: &Path) -> Result<usize> {
    let Some(first) = inputs.first() else {
        bail!("No tables to merge");
    };

    let mut writer = AtomicCsvWriter::create(output)?;
    let mut reference: Option<csv::StringRecord> = None;

    for path in inputs {
        let file = open_file(path)?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(file);
        let header = reader
            .headers()
            .with_context(|| format!("Failed to read header: {}", path.display()))?
            .clone();

        match &reference {
            None => {
                writer.write_record(&header)?;
                reference = Some(header);
            }
            Some(expected) if *expected != header => {
                return Err(SchemaError::HeaderMismatch {
                    path: path.display().to_string(),
                    reference: first.display().to_string(),
                }
                .into());
            }
            Some(_) => {}
        }

        for record in reader.records() {
            let record =
                record.with_context(|| format!("Failed to read row: {}", path.display()))?;
            writer.write_record(&record)?;
        }
    }

    // the header is counted too
    let rows = writer.rows().saturating_sub(1);
    writer.commit()?;
    Ok(rows)
}

pub fn run(inputs: &[String], output: &str) -> Result<()> {
    let paths: Vec<PathBuf> = inputs.iter().map(PathBuf::from).collect();
    let rows = merge_tables(&paths, Path::new(output))?;
    eprintln!(
        "\n✓ Merged {} tables ({} sessions) into: {}",
        paths.len(),
        format_number(rows),
        output
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_merge_keeps_one_header() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("week_1.csv");
        let b = dir.path().join("week_2.csv");
        fs::write(&a, "x,y\n1,2\n").unwrap();
        fs::write(&b, "x,y\n3,4\n5,6\n").unwrap();

        let out = dir.path().join("all.csv");
        let rows = merge_tables(&[a, b], &out).unwrap();
        assert_eq!(rows, 3);
        assert_eq!(fs::read_to_string(&out).unwrap(), "x,y\n1,2\n3,4\n5,6\n");
    }

    #[test]
    fn test_header_mismatch_publishes_nothing() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("week_1.csv");
        let b = dir.path().join("week_2.csv");
        fs::write(&a, "x,y\n1,2\n").unwrap();
        fs::write(&b, "x,z\n3,4\n").unwrap();

        let out = dir.path().join("all.csv");
        let err = merge_tables(&[a, b], &out).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SchemaError>(),
            Some(SchemaError::HeaderMismatch { .. })
        ));
        assert!(!out.exists());
    }

    #[test]
    fn test_no_inputs() {
        let dir = TempDir::new().unwrap();
        assert!(merge_tables(&[], &dir.path().join("all.csv")).is_err());
    }
}
