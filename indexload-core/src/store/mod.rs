//! Storage sink: the document store the loader resets and bulk-writes into.
//!
//! The sink handle is created once by the caller and passed explicitly into
//! the ingest driver and the query layer.

pub mod sqlite;

pub use sqlite::SqliteStore;

use crate::domain::CanonicalRecord;
use thiserror::Error;

/// Errors from the storage layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("document serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("no documents to insert into '{collection}'")]
    EmptyBatch { collection: String },

    #[error("invalid collection name '{0}' (allowed: letters, digits, underscore)")]
    InvalidCollection(String),
}

/// Destination for normalized batches.
///
/// `bulk_insert` is all-or-nothing from the caller's point of view: either the
/// whole batch is stored or an error is returned.
pub trait StorageSink {
    /// Remove every collection in the database.
    fn drop_database(&mut self) -> Result<(), StoreError>;

    /// Insert a batch into `collection`, creating it if needed.
    ///
    /// Returns the number of documents written.
    fn bulk_insert(
        &mut self,
        collection: &str,
        records: &[CanonicalRecord],
    ) -> Result<usize, StoreError>;
}

/// Sort direction on the `date` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Selection applied by [`SqliteStore::find`].
#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
    /// Inclusive `(from, to)` range on `date`.
    pub between: Option<(String, String)>,
    /// Exact `date` match.
    pub date: Option<String>,
    /// Exact match on the document's top-level `name` field.
    pub name: Option<String>,
    /// Exact match on the document's top-level `symbol` field.
    pub symbol: Option<String>,
    pub order: SortOrder,
    pub limit: Option<usize>,
}

impl DocumentFilter {
    pub fn between(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.between = Some((from.into(), to.into()));
        self
    }

    pub fn on_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    pub fn newest_first(mut self) -> Self {
        self.order = SortOrder::Descending;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Collection names become SQLite table names, so they are restricted to a
/// safe identifier alphabet.
pub(crate) fn validate_collection(name: &str) -> Result<(), StoreError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with("sqlite_");
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidCollection(name.to_string()))
    }
}
