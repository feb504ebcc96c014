//! Input opening with transparent decompression.
//!
//! Weekly event tables are large and commonly stored compressed. The
//! compression is chosen from the file extension:
//!
//! - `.gz` -> gzip (`flate2`)
//! - `.zst` -> Zstandard (`zstd`)
//! - anything else -> read as-is
//!
//! ```no_run
//! use insider_session_features::utils::reader::open_file;
//!
//! let reader = open_file("weeks/12.csv.zst").unwrap();
//! let mut csv_reader = csv::Reader::from_reader(reader);
//! for record in csv_reader.records() {
//!     let _record = record.unwrap();
//! }
//! ```

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Compression detected from a path's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Zstd,
}

impl Compression {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("gz") => Self::Gzip,
            Some("zst") => Self::Zstd,
            _ => Self::None,
        }
    }
}

/// Open `path` for reading, decompressing on the fly when the extension
/// says so. The returned reader is buffered.
pub fn open_file(path: impl AsRef<Path>) -> Result<Box<dyn Read + Send>> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;

    let reader: Box<dyn Read + Send> = match Compression::from_path(path) {
        Compression::Gzip => Box::new(GzDecoder::new(BufReader::new(file))),
        Compression::Zstd => Box::new(zstd::Decoder::new(file).with_context(|| {
            format!("Failed to create zstd decoder for: {}", path.display())
        })?),
        Compression::None => Box::new(BufReader::new(file)),
    };
    Ok(reader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn read_all(path: &Path) -> String {
        let mut contents = String::new();
        open_file(path)
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        contents
    }

    #[test]
    fn test_detects_compression() {
        assert_eq!(Compression::from_path(Path::new("3.csv.gz")), Compression::Gzip);
        assert_eq!(Compression::from_path(Path::new("3.csv.zst")), Compression::Zstd);
        assert_eq!(Compression::from_path(Path::new("3.csv")), Compression::None);
    }

    #[test]
    fn test_plain_file() {
        let mut temp = NamedTempFile::with_suffix(".csv").unwrap();
        write!(temp, "id,date\ne1,01/04/2010 08:00:00\n").unwrap();
        temp.flush().unwrap();

        assert_eq!(read_all(temp.path()), "id,date\ne1,01/04/2010 08:00:00\n");
    }

    #[test]
    fn test_gzip_file() {
        use flate2::write::GzEncoder;

        let mut temp = NamedTempFile::with_suffix(".csv.gz").unwrap();
        {
            let mut encoder = GzEncoder::new(&mut temp, flate2::Compression::default());
            write!(encoder, "id\ne1\n").unwrap();
            encoder.finish().unwrap();
        }
        temp.flush().unwrap();

        assert_eq!(read_all(temp.path()), "id\ne1\n");
    }

    #[test]
    fn test_zstd_file() {
        let mut temp = NamedTempFile::with_suffix(".csv.zst").unwrap();
        {
            let mut encoder = zstd::Encoder::new(&mut temp, 3).unwrap();
            write!(encoder, "id\ne2\n").unwrap();
            encoder.finish().unwrap();
        }
        temp.flush().unwrap();

        assert_eq!(read_all(temp.path()), "id\ne2\n");
    }

    #[test]
    fn test_missing_file() {
        let err = open_file("/nonexistent/7.csv").err().unwrap();
        assert!(err.to_string().contains("Failed to open file"));
    }
}
