//! CSV import provider for Yahoo-exported daily series.
//!
//! Layout: `{csv_dir}/{sp_500,dow,nasdaq}.csv`, comma-delimited UTF-8 with a
//! header row. Required columns: `Date,Open,High,Low,Close` (any order,
//! exact names). Extra columns such as `Adj Close` and `Volume` are ignored,
//! and a row may be shorter or longer than the header as long as the required
//! columns are present.

use super::normalize::{normalize_rows, RawDailyRow};
use super::provider::{DataProvider, IngestError};
use crate::domain::{CanonicalRecord, DataSource, MarketIndex};
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use tracing::debug;

/// Provider reading one CSV file per index from a directory.
pub struct CsvProvider {
    dir: PathBuf,
}

impl CsvProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the CSV file for `index`.
    pub fn path_for(&self, index: MarketIndex) -> PathBuf {
        self.dir.join(index.csv_file())
    }
}

impl DataProvider for CsvProvider {
    fn name(&self) -> &str {
        "yahoo_csv"
    }

    fn source(&self) -> DataSource {
        DataSource::File
    }

    fn fetch(&self, index: MarketIndex) -> Result<Vec<CanonicalRecord>, IngestError> {
        let path = self.path_for(index);
        debug!(path = %path.display(), "reading CSV");
        let file = File::open(&path)
            .map_err(|e| IngestError::Transport(format!("open {}: {e}", path.display())))?;
        let rows = read_rows(file).map_err(|e| match e {
            IngestError::Transport(msg) => {
                IngestError::Transport(format!("read {}: {msg}", path.display()))
            }
            IngestError::Decode(msg) => IngestError::Decode(format!("{}: {msg}", path.display())),
            IngestError::Schema(msg) => IngestError::Schema(format!("{}: {msg}", path.display())),
            other => other,
        })?;
        normalize_rows(rows)
    }
}

/// Decode every data row of a headered CSV stream.
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<RawDailyRow>, IngestError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(b',')
        .from_reader(reader);

    let mut rows = Vec::new();
    for result in rdr.deserialize::<RawDailyRow>() {
        rows.push(result.map_err(classify_csv_error)?);
    }
    Ok(rows)
}

fn classify_csv_error(err: csv::Error) -> IngestError {
    let message = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(e) => IngestError::Transport(e.to_string()),
        csv::ErrorKind::Utf8 { .. } | csv::ErrorKind::UnequalLengths { .. } => {
            IngestError::Decode(message)
        }
        csv::ErrorKind::Deserialize { .. } => IngestError::Schema(message),
        _ => IngestError::Decode(message),
    }
}
