//! SQLite-backed document store.
//!
//! Layout: one table per collection, each row holding one JSON document:
//!
//! ```text
//! "{collection}" (id INTEGER PRIMARY KEY AUTOINCREMENT, date TEXT NOT NULL, document TEXT NOT NULL)
//! ```
//!
//! - Tables are created by the first insert into a collection
//! - `drop_database` removes every table
//! - A bulk insert runs inside one transaction
//! - Reads on a collection that does not exist return no documents

use super::{validate_collection, DocumentFilter, SortOrder, StorageSink, StoreError};
use crate::domain::CanonicalRecord;
use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// Document store over a single SQLite database.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            "#,
        )?;
        info!(path = %path.display(), "opened document store");
        Ok(Self { conn })
    }

    /// Open a private in-memory database (tests, scratch runs).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Names of all collections currently in the database, sorted.
    pub fn collection_names(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\' \
             ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    /// Whether `collection` exists.
    pub fn has_collection(&self, collection: &str) -> Result<bool, StoreError> {
        validate_collection(collection)?;
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![collection],
            |row| row.get(0),
        )?;
        Ok(n > 0)
    }

    /// Number of documents in `collection` (0 if it does not exist).
    pub fn count(&self, collection: &str) -> Result<usize, StoreError> {
        if !self.has_collection(collection)? {
            return Ok(0);
        }
        let n: i64 =
            self.conn
                .query_row(&format!("SELECT COUNT(*) FROM \"{collection}\""), [], |row| {
                    row.get(0)
                })?;
        Ok(n as usize)
    }

    /// Insert a single document keyed by `date`.
    pub fn insert_one<T: Serialize>(
        &mut self,
        collection: &str,
        date: &str,
        document: &T,
    ) -> Result<(), StoreError> {
        let json = serde_json::to_string(document)?;
        self.insert_documents(collection, vec![(date.to_string(), json)])?;
        Ok(())
    }

    /// Fetch documents from `collection` matching `filter`.
    pub fn find<T: DeserializeOwned>(
        &self,
        collection: &str,
        filter: &DocumentFilter,
    ) -> Result<Vec<T>, StoreError> {
        if !self.has_collection(collection)? {
            return Ok(Vec::new());
        }

        let mut clauses: Vec<String> = Vec::new();
        let mut values: Vec<String> = Vec::new();

        if let Some((from, to)) = &filter.between {
            clauses.push(format!(
                "date BETWEEN ?{} AND ?{}",
                values.len() + 1,
                values.len() + 2
            ));
            values.push(from.clone());
            values.push(to.clone());
        }
        if let Some(date) = &filter.date {
            clauses.push(format!("date = ?{}", values.len() + 1));
            values.push(date.clone());
        }
        if let Some(name) = &filter.name {
            clauses.push(format!(
                "json_extract(document, '$.name') = ?{}",
                values.len() + 1
            ));
            values.push(name.clone());
        }
        if let Some(symbol) = &filter.symbol {
            clauses.push(format!(
                "json_extract(document, '$.symbol') = ?{}",
                values.len() + 1
            ));
            values.push(symbol.clone());
        }

        let mut sql = format!("SELECT document FROM \"{collection}\"");
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(match filter.order {
            SortOrder::Ascending => " ORDER BY date ASC, id ASC",
            SortOrder::Descending => " ORDER BY date DESC, id DESC",
        });
        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(values.iter()), |row| {
            row.get::<_, String>(0)
        })?;

        let mut documents = Vec::new();
        for row in rows {
            documents.push(serde_json::from_str(&row?)?);
        }
        Ok(documents)
    }

    fn ensure_collection(conn: &Connection, collection: &str) -> Result<(), StoreError> {
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS \"{collection}\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL,
                document TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS \"idx_{collection}_date\" ON \"{collection}\"(date);"
        ))?;
        Ok(())
    }

    /// Write `(date, json)` pairs in one transaction.
    fn insert_documents(
        &mut self,
        collection: &str,
        documents: Vec<(String, String)>,
    ) -> Result<usize, StoreError> {
        validate_collection(collection)?;
        if documents.is_empty() {
            return Err(StoreError::EmptyBatch {
                collection: collection.to_string(),
            });
        }

        let tx = self.conn.transaction()?;
        Self::ensure_collection(&tx, collection)?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO \"{collection}\" (date, document) VALUES (?1, ?2)"
            ))?;
            for (date, json) in &documents {
                stmt.execute(params![date, json])?;
            }
        }
        tx.commit()?;

        debug!(collection, count = documents.len(), "batch committed");
        Ok(documents.len())
    }
}

impl StorageSink for SqliteStore {
    fn drop_database(&mut self) -> Result<(), StoreError> {
        let names = self.collection_names()?;
        let tx = self.conn.transaction()?;
        for name in &names {
            tx.execute(&format!("DROP TABLE IF EXISTS \"{name}\""), [])?;
        }
        tx.commit()?;
        info!(dropped = names.len(), "database reset");
        Ok(())
    }

    fn bulk_insert(
        &mut self,
        collection: &str,
        records: &[CanonicalRecord],
    ) -> Result<usize, StoreError> {
        let documents = records
            .iter()
            .map(|r| Ok((r.date.clone(), serde_json::to_string(r)?)))
            .collect::<Result<Vec<_>, StoreError>>()?;
        self.insert_documents(collection, documents)
    }
}
