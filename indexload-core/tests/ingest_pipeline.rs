//! End-to-end tests for the six-job load: reset, fetch, normalize, bulk insert.
//!
//! The API side is a canned provider that decodes fixed response bodies; the
//! file side reads the CSV fixtures under `tests/fixtures`.

use indexload_core::data::alpha_vantage::decode_daily_response;
use indexload_core::data::{
    normalize_api, run_ingest, CsvProvider, DataProvider, FailurePolicy, IngestError, IngestJob,
    Providers, SilentProgress,
};
use indexload_core::domain::{CanonicalRecord, DataSource, MarketIndex};
use indexload_core::store::{DocumentFilter, SqliteStore, StorageSink};
use std::cell::Cell;
use std::path::PathBuf;

fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn api_body(index: MarketIndex) -> String {
    let (first, second) = match index {
        MarketIndex::Sp500 => ("3257.8501", "3234.8501"),
        MarketIndex::Dow => ("28868.80", "28634.88"),
        MarketIndex::Nasdaq => ("40.5100", "40.2700"),
    };
    format!(
        r#"{{
            "Meta Data": {{"2. Symbol": "{symbol}"}},
            "Time Series (Daily)": {{
                "2020-01-03": {{"1. open": "1.0", "2. high": "2.0", "3. low": "0.5", "4. close": "{second}", "5. volume": "10"}},
                "2020-01-02": {{"1. open": "1.0", "2. high": "2.0", "3. low": "0.5", "4. close": "{first}", "5. volume": "10"}}
            }}
        }}"#,
        symbol = index.api_symbol()
    )
}

/// API stand-in serving canned bodies, optionally failing one index.
struct CannedApi {
    fail_on: Option<MarketIndex>,
    calls: Cell<usize>,
}

impl CannedApi {
    fn new() -> Self {
        Self {
            fail_on: None,
            calls: Cell::new(0),
        }
    }

    fn failing_on(index: MarketIndex) -> Self {
        Self {
            fail_on: Some(index),
            calls: Cell::new(0),
        }
    }
}

impl DataProvider for CannedApi {
    fn name(&self) -> &str {
        "canned"
    }

    fn source(&self) -> DataSource {
        DataSource::Api
    }

    fn fetch(&self, index: MarketIndex) -> Result<Vec<CanonicalRecord>, IngestError> {
        self.calls.set(self.calls.get() + 1);
        if self.fail_on == Some(index) {
            return Err(IngestError::Transport("connection refused".into()));
        }
        normalize_api(decode_daily_response(&api_body(index))?)
    }
}

#[test]
fn full_load_fills_six_collections() {
    let api = CannedApi::new();
    let files = CsvProvider::new(fixture_dir());
    let providers = Providers {
        api: &api,
        file: &files,
    };
    let mut store = SqliteStore::open_in_memory().unwrap();

    let summary = run_ingest(
        &IngestJob::default_plan(),
        &providers,
        &mut store,
        FailurePolicy::Abort,
        &SilentProgress,
    )
    .unwrap();

    assert!(summary.all_succeeded());
    assert_eq!(summary.succeeded(), 6);
    assert_eq!(
        store.collection_names().unwrap(),
        ["dow", "dow_yahoo", "nasdaq", "nasdaq_yahoo", "sp_500", "sp_500_yahoo"]
    );

    // One document per CSV row / API date key.
    assert_eq!(store.count("sp_500_yahoo").unwrap(), 3);
    assert_eq!(store.count("dow_yahoo").unwrap(), 2);
    assert_eq!(store.count("nasdaq_yahoo").unwrap(), 4);
    assert_eq!(store.count("sp_500").unwrap(), 2);
    assert_eq!(store.count("dow").unwrap(), 2);
    assert_eq!(store.count("nasdaq").unwrap(), 2);
    assert_eq!(summary.documents(), 15);
}

#[test]
fn stored_documents_keep_source_text() {
    let api = CannedApi::new();
    let files = CsvProvider::new(fixture_dir());
    let providers = Providers {
        api: &api,
        file: &files,
    };
    let mut store = SqliteStore::open_in_memory().unwrap();
    run_ingest(
        &IngestJob::default_plan(),
        &providers,
        &mut store,
        FailurePolicy::Abort,
        &SilentProgress,
    )
    .unwrap();

    let csv_docs: Vec<CanonicalRecord> = store
        .find("sp_500_yahoo", &DocumentFilter::default())
        .unwrap();
    assert_eq!(csv_docs[0].date, "2020-01-02");
    assert_eq!(csv_docs[0].open, "3244.669922");
    assert_eq!(csv_docs[0].close, "3257.850098");
    assert_eq!(csv_docs[0].date_pieces.month, "01");

    let api_docs: Vec<CanonicalRecord> = store.find("sp_500", &DocumentFilter::default()).unwrap();
    assert_eq!(api_docs.len(), 2);
    assert_eq!(api_docs[0].close, "3257.8501");
    assert_eq!(api_docs[1].close, "3234.8501");
}

#[test]
fn abort_policy_skips_remaining_jobs() {
    let api = CannedApi::failing_on(MarketIndex::Dow);
    let files = CsvProvider::new(fixture_dir());
    let providers = Providers {
        api: &api,
        file: &files,
    };
    let mut store = SqliteStore::open_in_memory().unwrap();

    let summary = run_ingest(
        &IngestJob::default_plan(),
        &providers,
        &mut store,
        FailurePolicy::Abort,
        &SilentProgress,
    )
    .unwrap();

    assert!(!summary.all_succeeded());
    assert_eq!(summary.succeeded(), 4);
    assert_eq!(summary.failed(), 1);
    assert_eq!(
        summary.skipped,
        [IngestJob::new(MarketIndex::Nasdaq, DataSource::Api)]
    );
    assert_eq!(api.calls.get(), 2);

    let (job, err) = &summary.errors[0];
    assert_eq!(job.to_string(), "DOW (API)");
    assert!(matches!(err, IngestError::Transport(_)));

    // Earlier jobs stay written; failed and skipped collections are absent.
    assert_eq!(store.count("sp_500").unwrap(), 2);
    assert!(!store.has_collection("dow").unwrap());
    assert!(!store.has_collection("nasdaq").unwrap());
}

#[test]
fn continue_policy_runs_every_job() {
    let api = CannedApi::failing_on(MarketIndex::Sp500);
    let files = CsvProvider::new(fixture_dir());
    let providers = Providers {
        api: &api,
        file: &files,
    };
    let mut store = SqliteStore::open_in_memory().unwrap();

    let summary = run_ingest(
        &IngestJob::default_plan(),
        &providers,
        &mut store,
        FailurePolicy::Continue,
        &SilentProgress,
    )
    .unwrap();

    assert_eq!(summary.succeeded(), 5);
    assert_eq!(summary.failed(), 1);
    assert!(summary.skipped.is_empty());
    assert_eq!(api.calls.get(), 3);
    assert!(!store.has_collection("sp_500").unwrap());
    assert_eq!(store.count("nasdaq").unwrap(), 2);
}

#[test]
fn missing_csv_fails_the_file_job() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::copy(fixture_dir().join("sp_500.csv"), dir.path().join("sp_500.csv")).unwrap();

    let api = CannedApi::new();
    let files = CsvProvider::new(dir.path());
    let providers = Providers {
        api: &api,
        file: &files,
    };
    let mut store = SqliteStore::open_in_memory().unwrap();

    let summary = run_ingest(
        &IngestJob::default_plan(),
        &providers,
        &mut store,
        FailurePolicy::Abort,
        &SilentProgress,
    )
    .unwrap();

    assert_eq!(summary.succeeded(), 1);
    let (job, err) = &summary.errors[0];
    assert_eq!(*job, IngestJob::new(MarketIndex::Dow, DataSource::File));
    assert!(matches!(err, IngestError::Transport(_)));
    assert!(err.to_string().contains("dow.csv"));
    assert_eq!(summary.skipped.len(), 4);
    assert_eq!(api.calls.get(), 0);
}

#[test]
fn header_only_csv_is_an_empty_batch() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("sp_500.csv"),
        "Date,Open,High,Low,Close,Adj Close,Volume\n",
    )
    .unwrap();

    let api = CannedApi::new();
    let files = CsvProvider::new(dir.path());
    let providers = Providers {
        api: &api,
        file: &files,
    };
    let mut store = SqliteStore::open_in_memory().unwrap();

    let summary = run_ingest(
        &IngestJob::default_plan(),
        &providers,
        &mut store,
        FailurePolicy::Abort,
        &SilentProgress,
    )
    .unwrap();

    assert!(matches!(summary.errors[0].1, IngestError::Storage(_)));
    assert!(!store.has_collection("sp_500_yahoo").unwrap());
}

#[test]
fn rerun_resets_and_reproduces_the_same_content() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("market.db");

    let api = CannedApi::new();
    let files = CsvProvider::new(fixture_dir());
    let providers = Providers {
        api: &api,
        file: &files,
    };

    let run = || {
        let mut store = SqliteStore::open(&db).unwrap();
        let summary = run_ingest(
            &IngestJob::default_plan(),
            &providers,
            &mut store,
            FailurePolicy::Abort,
            &SilentProgress,
        )
        .unwrap();
        let counts: Vec<usize> = store
            .collection_names()
            .unwrap()
            .iter()
            .map(|c| store.count(c).unwrap())
            .collect();
        let hashes: Vec<String> = summary
            .outcomes
            .iter()
            .map(|o| o.content_hash.clone())
            .collect();
        (counts, hashes)
    };

    let first = run();
    let second = run();
    assert_eq!(first, second);
}

#[test]
fn reset_removes_unrelated_collections() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    let stale = CanonicalRecord::new("1999-01-01", "1", "1", "1", "1").unwrap();
    store.bulk_insert("old_collection", &[stale]).unwrap();

    let api = CannedApi::new();
    let files = CsvProvider::new(fixture_dir());
    let providers = Providers {
        api: &api,
        file: &files,
    };
    run_ingest(
        &IngestJob::default_plan(),
        &providers,
        &mut store,
        FailurePolicy::Abort,
        &SilentProgress,
    )
    .unwrap();

    assert!(!store.has_collection("old_collection").unwrap());
    assert_eq!(store.collection_names().unwrap().len(), 6);
}
