//! Ingest driver: reset the store once, then run every job in order.
//!
//! Each job is fetch → normalize → one bulk insert into the job's collection.
//! Job results are explicit values collected into an [`IngestSummary`]; the
//! [`FailurePolicy`] decides whether a failure stops the remaining jobs.

use super::provider::{DataProvider, IngestError, IngestProgress};
use crate::domain::{CanonicalRecord, DataSource, MarketIndex};
use crate::store::{StorageSink, StoreError};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{error, info, warn};

/// One (index × source) load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IngestJob {
    pub index: MarketIndex,
    pub source: DataSource,
}

impl IngestJob {
    pub fn new(index: MarketIndex, source: DataSource) -> Self {
        Self { index, source }
    }

    /// The six jobs in load order: every file-sourced job, then every API job.
    pub fn default_plan() -> Vec<IngestJob> {
        [DataSource::File, DataSource::Api]
            .into_iter()
            .flat_map(|source| MarketIndex::ALL.into_iter().map(move |index| Self::new(index, source)))
            .collect()
    }

    /// Collection this job writes into.
    pub fn collection(&self) -> String {
        self.index.collection(self.source)
    }
}

impl fmt::Display for IngestJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.index.display_name(), self.source.label())
    }
}

/// What to do with the remaining jobs once one has failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop at the first failure; later jobs are skipped.
    #[default]
    Abort,
    /// Run every job regardless of earlier failures.
    Continue,
}

/// The two providers a plan draws from.
pub struct Providers<'a> {
    pub api: &'a dyn DataProvider,
    pub file: &'a dyn DataProvider,
}

impl<'a> Providers<'a> {
    pub fn for_source(&self, source: DataSource) -> &'a dyn DataProvider {
        match source {
            DataSource::Api => self.api,
            DataSource::File => self.file,
        }
    }
}

/// A job that completed.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub job: IngestJob,
    pub collection: String,
    pub inserted: usize,
    /// BLAKE3 over the serialized batch, in insert order.
    pub content_hash: String,
}

/// Summary of a full load.
#[derive(Debug)]
pub struct IngestSummary {
    pub total: usize,
    pub outcomes: Vec<JobOutcome>,
    pub errors: Vec<(IngestJob, IngestError)>,
    pub skipped: Vec<IngestJob>,
}

impl IngestSummary {
    fn new(total: usize) -> Self {
        Self {
            total,
            outcomes: Vec::new(),
            errors: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.len()
    }

    pub fn failed(&self) -> usize {
        self.errors.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.errors.is_empty() && self.skipped.is_empty()
    }

    /// Total documents inserted across all successful jobs.
    pub fn documents(&self) -> usize {
        self.outcomes.iter().map(|o| o.inserted).sum()
    }
}

/// Reset `sink`, then run `plan` job by job.
///
/// Returns `Err` only if the reset itself fails; job failures are recorded
/// in the summary.
pub fn run_ingest(
    plan: &[IngestJob],
    providers: &Providers<'_>,
    sink: &mut dyn StorageSink,
    policy: FailurePolicy,
    progress: &dyn IngestProgress,
) -> Result<IngestSummary, StoreError> {
    sink.drop_database()?;
    info!(jobs = plan.len(), ?policy, "database dropped, starting load");

    let total = plan.len();
    let mut summary = IngestSummary::new(total);

    for (i, job) in plan.iter().enumerate() {
        progress.on_start(job, i, total);
        let provider = providers.for_source(job.source);
        info!(
            job = %job,
            provider = provider.name(),
            collection = %job.collection(),
            "job started"
        );

        let result = run_job(job, provider, sink);
        progress.on_complete(job, result.as_ref().map(|o| o.inserted));

        match result {
            Ok(outcome) => {
                info!(
                    job = %job,
                    inserted = outcome.inserted,
                    hash = %outcome.content_hash,
                    "job finished"
                );
                summary.outcomes.push(outcome);
            }
            Err(e) => {
                error!(job = %job, error = %e, "job failed");
                summary.errors.push((*job, e));
                if policy == FailurePolicy::Abort {
                    summary.skipped.extend_from_slice(&plan[(i + 1)..]);
                    if !summary.skipped.is_empty() {
                        warn!(skipped = summary.skipped.len(), "aborting remaining jobs");
                    }
                    break;
                }
            }
        }
    }

    progress.on_batch_complete(&summary);
    Ok(summary)
}

/// Run a single job: fetch → normalize → bulk insert.
pub fn run_job(
    job: &IngestJob,
    provider: &dyn DataProvider,
    sink: &mut dyn StorageSink,
) -> Result<JobOutcome, IngestError> {
    let records = provider.fetch(job.index)?;
    let content_hash = batch_hash(&records)?;
    let collection = job.collection();
    let inserted = sink.bulk_insert(&collection, &records)?;
    Ok(JobOutcome {
        job: *job,
        collection,
        inserted,
        content_hash,
    })
}

/// Content hash of a batch, stable across runs over the same source data.
pub fn batch_hash(records: &[CanonicalRecord]) -> Result<String, IngestError> {
    let bytes = serde_json::to_vec(records).map_err(StoreError::from)?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}
