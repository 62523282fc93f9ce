//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over the two sources of daily index data
//! (the time-series HTTP API and Yahoo-exported CSV files) so the ingest
//! driver can treat them alike and tests can substitute mocks.

use crate::data::ingest::{IngestJob, IngestSummary};
use crate::domain::{CanonicalRecord, DataSource, DateFormatError, MarketIndex};
use crate::store::StoreError;
use thiserror::Error;

/// Errors from a single ingestion job.
///
/// None of these are recovered from inside a job; they are reported to the
/// driver, which applies the failure policy.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Network or file unavailable, or the server answered with an error status.
    #[error("transport error: {0}")]
    Transport(String),

    /// Body is not valid JSON, or the file is not valid UTF-8 / CSV.
    #[error("decode error: {0}")]
    Decode(String),

    /// Expected key or column is missing.
    #[error("schema error: {0}")]
    Schema(String),

    /// A date did not split into year, month and day.
    #[error("format error: {0}")]
    Format(#[from] DateFormatError),

    /// The storage sink rejected the batch.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

/// Trait for sources of daily index data.
///
/// `fetch` returns the full normalized batch for one index.
pub trait DataProvider {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Which collection family this provider's records belong to.
    fn source(&self) -> DataSource;

    /// Fetch and normalize the complete daily series for `index`.
    fn fetch(&self, index: MarketIndex) -> Result<Vec<CanonicalRecord>, IngestError>;
}

/// Progress callback for the six-job load.
pub trait IngestProgress {
    /// Called before a job starts.
    fn on_start(&self, job: &IngestJob, index: usize, total: usize);

    /// Called when a job finishes. `Ok` carries the number of inserted documents.
    fn on_complete(&self, job: &IngestJob, result: Result<usize, &IngestError>);

    /// Called once after the last job ran (or the run was aborted).
    fn on_batch_complete(&self, summary: &IngestSummary);
}

/// Progress reporter that prints one marker line per job to stdout.
pub struct StdoutProgress;

impl IngestProgress for StdoutProgress {
    fn on_start(&self, job: &IngestJob, _index: usize, _total: usize) {
        println!("{job}");
    }

    fn on_complete(&self, job: &IngestJob, result: Result<usize, &IngestError>) {
        match result {
            Ok(count) => println!("  OK: {} ({count} documents)", job.collection()),
            Err(e) => println!("  FAIL: {}: {e}", job.collection()),
        }
    }

    fn on_batch_complete(&self, summary: &IngestSummary) {
        println!(
            "\nLoad complete: {}/{} succeeded, {} failed, {} skipped",
            summary.succeeded(),
            summary.total,
            summary.failed(),
            summary.skipped.len()
        );
    }
}

/// Progress reporter that prints nothing.
pub struct SilentProgress;

impl IngestProgress for SilentProgress {
    fn on_start(&self, _job: &IngestJob, _index: usize, _total: usize) {}
    fn on_complete(&self, _job: &IngestJob, _result: Result<usize, &IngestError>) {}
    fn on_batch_complete(&self, _summary: &IngestSummary) {}
}
