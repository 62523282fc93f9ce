//! Query layer over the loaded collections.
//!
//! Every lookup accepts a collection base name (`dow`), a market symbol
//! (`DJIA`) or an API symbol (`DJI`). Reads go to one collection family,
//! selected by [`DataSource`]: the file-derived `_yahoo` collections by
//! default, or the API collections.
//!
//! Manual inserts are validated (date format, numeric prices, no duplicate
//! date), unlike the bulk load path which copies source values verbatim.

use crate::domain::{split_date, CanonicalRecord, DataSource, MarketIndex, PredictionRecord};
use crate::store::{DocumentFilter, SqliteStore, StoreError};
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

/// Collection shared by all predictions.
pub const PREDICTIONS: &str = "predictions";

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error)]
pub enum QueryError {
    #[error(
        "invalid collection '{0}': run `collections` for collection names or `symbols` for market symbols"
    )]
    UnknownCollection(String),

    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("record for given date ({date}) already exists")]
    Duplicate { date: String },

    #[error("no records in '{collection}'")]
    Empty { collection: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl QueryError {
    fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        QueryError::Validation {
            field,
            message: message.into(),
        }
    }
}

/// Inclusive date range, validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub from: String,
    pub to: String,
}

impl DateRange {
    /// Validate optional `from`/`to` bounds.
    ///
    /// - neither given → no range
    /// - `from` without `to` → error
    /// - `to` without `from` → `to` is validated, no range applied
    /// - both → both validated and `to >= from`
    pub fn parse(from: Option<&str>, to: Option<&str>) -> Result<Option<DateRange>, QueryError> {
        match (from, to) {
            (None, None) => Ok(None),
            (Some(_), None) => Err(QueryError::invalid("to", "'to' is required with 'from'")),
            (None, Some(to)) => {
                parse_date("to", to)?;
                Ok(None)
            }
            (Some(from), Some(to)) => {
                let start = parse_date("from", from)?;
                let end = parse_date("to", to)?;
                if end < start {
                    return Err(QueryError::invalid(
                        "to",
                        "'to' must be after or equal to 'from'",
                    ));
                }
                Ok(Some(DateRange {
                    from: from.to_string(),
                    to: to.to_string(),
                }))
            }
        }
    }
}

/// A manually entered daily record.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub date: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
}

/// Response envelope: which collection, which symbol, and the documents.
#[derive(Debug, Clone, Serialize)]
pub struct MarketResponse<T> {
    pub name: String,
    pub symbol: String,
    pub data: T,
}

/// The newest record of a collection, tagged with its name and symbol.
#[derive(Debug, Clone, Serialize)]
pub struct LatestRecord {
    #[serde(flatten)]
    pub record: CanonicalRecord,
    pub name: String,
    pub symbol: String,
}

/// Query handle over a document store.
pub struct MarketQuery<'a> {
    store: &'a mut SqliteStore,
    source: DataSource,
}

impl<'a> MarketQuery<'a> {
    /// Query the file-derived collections.
    pub fn new(store: &'a mut SqliteStore) -> Self {
        Self {
            store,
            source: DataSource::File,
        }
    }

    /// Switch the collection family reads and inserts go to.
    pub fn with_source(mut self, source: DataSource) -> Self {
        self.source = source;
        self
    }

    /// Collection base names.
    pub fn collections() -> Vec<&'static str> {
        Self::listing_order()
            .iter()
            .map(|i| i.collection_base())
            .collect()
    }

    /// Market symbols, in the same order as [`Self::collections`].
    pub fn symbols() -> Vec<&'static str> {
        Self::listing_order()
            .iter()
            .map(|i| i.market_symbol())
            .collect()
    }

    fn listing_order() -> [MarketIndex; 3] {
        [MarketIndex::Dow, MarketIndex::Nasdaq, MarketIndex::Sp500]
    }

    /// Resolve a collection name or symbol.
    pub fn resolve(input: &str) -> Result<MarketIndex, QueryError> {
        MarketIndex::resolve(input).ok_or_else(|| QueryError::UnknownCollection(input.to_string()))
    }

    fn respond<T>(index: MarketIndex, data: T) -> MarketResponse<T> {
        MarketResponse {
            name: index.collection_base().to_string(),
            symbol: index.market_symbol().to_string(),
            data,
        }
    }

    /// Records ordered by date ascending, optionally limited to `range`.
    pub fn get(
        &self,
        input: &str,
        range: Option<&DateRange>,
    ) -> Result<MarketResponse<Vec<CanonicalRecord>>, QueryError> {
        let index = Self::resolve(input)?;
        let mut filter = DocumentFilter::default();
        if let Some(r) = range {
            filter = filter.between(&r.from, &r.to);
        }
        let data = self.store.find(&index.collection(self.source), &filter)?;
        Ok(Self::respond(index, data))
    }

    /// The newest `days` records, newest first.
    pub fn recent(
        &self,
        input: &str,
        days: i64,
    ) -> Result<MarketResponse<Vec<CanonicalRecord>>, QueryError> {
        let index = Self::resolve(input)?;
        let limit = validate_days(days)?;
        let filter = DocumentFilter::default().newest_first().limit(limit);
        let data = self.store.find(&index.collection(self.source), &filter)?;
        Ok(Self::respond(index, data))
    }

    /// The newest record.
    pub fn latest(&self, input: &str) -> Result<LatestRecord, QueryError> {
        let index = Self::resolve(input)?;
        let collection = index.collection(self.source);
        let filter = DocumentFilter::default().newest_first().limit(1);
        let record = self
            .store
            .find::<CanonicalRecord>(&collection, &filter)?
            .into_iter()
            .next()
            .ok_or(QueryError::Empty { collection })?;
        Ok(LatestRecord {
            record,
            name: index.collection_base().to_string(),
            symbol: index.market_symbol().to_string(),
        })
    }

    /// Validate and store one daily record.
    pub fn insert(&mut self, input: &str, new: NewRecord) -> Result<CanonicalRecord, QueryError> {
        let index = Self::resolve(input)?;
        parse_date("date", &new.date)?;
        validate_numeric("close", &new.close)?;
        validate_numeric("open", &new.open)?;
        validate_numeric("low", &new.low)?;
        validate_numeric("high", &new.high)?;

        let collection = index.collection(self.source);
        let existing = self.store.find::<CanonicalRecord>(
            &collection,
            &DocumentFilter::default().on_date(&new.date).limit(1),
        )?;
        if !existing.is_empty() {
            return Err(QueryError::Duplicate { date: new.date });
        }

        let record = CanonicalRecord::new(new.date, new.open, new.high, new.low, new.close)
            .map_err(|e| QueryError::invalid("date", e.to_string()))?;
        self.store.insert_one(&collection, &record.date, &record)?;
        Ok(record)
    }

    /// Validate and store one predicted close.
    pub fn insert_prediction(
        &mut self,
        input: &str,
        date: &str,
        close: &str,
    ) -> Result<PredictionRecord, QueryError> {
        let index = Self::resolve(input)?;
        parse_date("date", date)?;
        validate_numeric("close", close)?;

        let existing = self.store.find::<PredictionRecord>(
            PREDICTIONS,
            &DocumentFilter::default()
                .on_date(date)
                .with_symbol(index.market_symbol())
                .limit(1),
        )?;
        if !existing.is_empty() {
            return Err(QueryError::Duplicate {
                date: date.to_string(),
            });
        }

        let record = PredictionRecord {
            date: date.to_string(),
            date_pieces: split_date(date).map_err(|e| QueryError::invalid("date", e.to_string()))?,
            close: close.to_string(),
            symbol: index.market_symbol().to_string(),
            name: index.collection_base().to_string(),
        };
        self.store.insert_one(PREDICTIONS, date, &record)?;
        Ok(record)
    }

    /// Predictions for one index ordered by date ascending, optionally limited to `range`.
    pub fn predictions(
        &self,
        input: &str,
        range: Option<&DateRange>,
    ) -> Result<MarketResponse<Vec<PredictionRecord>>, QueryError> {
        let index = Self::resolve(input)?;
        let mut filter = DocumentFilter::default().named(index.collection_base());
        if let Some(r) = range {
            filter = filter.between(&r.from, &r.to);
        }
        let data = self.store.find(PREDICTIONS, &filter)?;
        Ok(Self::respond(index, data))
    }

    /// The newest `days` predictions for one index, newest first.
    pub fn recent_predictions(
        &self,
        input: &str,
        days: i64,
    ) -> Result<MarketResponse<Vec<PredictionRecord>>, QueryError> {
        let index = Self::resolve(input)?;
        let limit = validate_days(days)?;
        let filter = DocumentFilter::default()
            .named(index.collection_base())
            .newest_first()
            .limit(limit);
        let data = self.store.find(PREDICTIONS, &filter)?;
        Ok(Self::respond(index, data))
    }
}

/// Strict `YYYY-MM-DD`: a real calendar date, zero-padded.
fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, QueryError> {
    let invalid = || QueryError::invalid(field, "date format invalid. Format: 1999-01-01");
    if value.len() != 10 {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| invalid())
}

fn validate_numeric(field: &'static str, value: &str) -> Result<(), QueryError> {
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(()),
        _ => Err(QueryError::invalid(field, format!("'{value}' is not numeric"))),
    }
}

fn validate_days(days: i64) -> Result<usize, QueryError> {
    if days < 1 {
        return Err(QueryError::invalid("days", "must be at least 1"));
    }
    Ok(days as usize)
}
