//! Data providers, normalization and the ingest driver

pub mod alpha_vantage;
pub mod csv_import;
pub mod ingest;
pub mod normalize;
pub mod provider;

pub use alpha_vantage::AlphaVantageProvider;
pub use csv_import::CsvProvider;
pub use ingest::{
    run_ingest, run_job, FailurePolicy, IngestJob, IngestSummary, JobOutcome, Providers,
};
pub use normalize::{normalize_api, normalize_rows, RawDailyPoint, RawDailyRow, RawDailySeries};
pub use provider::{DataProvider, IngestError, IngestProgress, SilentProgress, StdoutProgress};
