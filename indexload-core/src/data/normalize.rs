//! Raw source shapes and their mapping to [`CanonicalRecord`].
//!
//! Both paths are plain field renames plus the date split. Values are never
//! parsed, trimmed or checked, and nothing is deduplicated.

use super::provider::IngestError;
use crate::domain::CanonicalRecord;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Labelled fields of one date in the API's daily time series.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawDailyPoint {
    #[serde(rename = "1. open")]
    pub open: String,
    #[serde(rename = "2. high")]
    pub high: String,
    #[serde(rename = "3. low")]
    pub low: String,
    #[serde(rename = "4. close")]
    pub close: String,
}

/// Daily series keyed by `YYYY-MM-DD`.
///
/// Entries iterate oldest-first regardless of response order; the bulk insert
/// does not depend on order.
pub type RawDailySeries = BTreeMap<String, RawDailyPoint>;

/// One data row of an exported CSV file.
///
/// Columns are matched by exact header name; other columns are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawDailyRow {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Open")]
    pub open: String,
    #[serde(rename = "High")]
    pub high: String,
    #[serde(rename = "Low")]
    pub low: String,
    #[serde(rename = "Close")]
    pub close: String,
}

/// One record per date key of an API series.
pub fn normalize_api(series: RawDailySeries) -> Result<Vec<CanonicalRecord>, IngestError> {
    series
        .into_iter()
        .map(|(date, point)| {
            CanonicalRecord::new(date, point.open, point.high, point.low, point.close)
                .map_err(IngestError::from)
        })
        .collect()
}

/// One record per CSV data row, in file order.
pub fn normalize_rows(rows: Vec<RawDailyRow>) -> Result<Vec<CanonicalRecord>, IngestError> {
    rows.into_iter()
        .map(|row| {
            CanonicalRecord::new(row.date, row.open, row.high, row.low, row.close)
                .map_err(IngestError::from)
        })
        .collect()
}
