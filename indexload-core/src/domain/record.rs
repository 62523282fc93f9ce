//! CanonicalRecord: the normalized daily document shared by both ingestion paths.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A date string split on `-` into its three components.
///
/// Components are kept as strings so that `year-month-day` reassembles to
/// exactly the date they were split from (no zero-padding is added or lost).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatePieces {
    pub year: String,
    pub month: String,
    pub day: String,
}

impl DatePieces {
    /// Reassemble the original date string.
    pub fn join(&self) -> String {
        format!("{}-{}-{}", self.year, self.month, self.day)
    }
}

/// A date that does not split into exactly three `-`-separated parts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("date '{date}' splits into {parts} part(s) on '-', expected 3")]
pub struct DateFormatError {
    pub date: String,
    pub parts: usize,
}

/// Split a `YYYY-MM-DD` date string into its pieces.
///
/// Only the separator count is checked. The pieces are not parsed as numbers.
pub fn split_date(date: &str) -> Result<DatePieces, DateFormatError> {
    let parts: Vec<&str> = date.split('-').collect();
    match parts.as_slice() {
        [year, month, day] => Ok(DatePieces {
            year: (*year).to_string(),
            month: (*month).to_string(),
            day: (*day).to_string(),
        }),
        _ => Err(DateFormatError {
            date: date.to_string(),
            parts: parts.len(),
        }),
    }
}

/// One trading day of one index, as stored in a collection.
///
/// Price fields are copied verbatim from the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub date: String,
    pub date_pieces: DatePieces,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
}

impl CanonicalRecord {
    /// Build a record from raw string fields, splitting the date.
    pub fn new(
        date: impl Into<String>,
        open: impl Into<String>,
        high: impl Into<String>,
        low: impl Into<String>,
        close: impl Into<String>,
    ) -> Result<Self, DateFormatError> {
        let date = date.into();
        let date_pieces = split_date(&date)?;
        Ok(Self {
            date,
            date_pieces,
            open: open.into(),
            high: high.into(),
            low: low.into(),
            close: close.into(),
        })
    }
}

/// A predicted close for one index on one date.
///
/// All predictions share the `predictions` collection and are told apart by
/// `name` (collection base name) and `symbol` (market symbol).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub date: String,
    pub date_pieces: DatePieces,
    pub close: String,
    pub symbol: String,
    pub name: String,
}
