//! indexload core: ingestion, normalization and storage for daily index data.
//!
//! This crate contains everything the `indexload` binary does:
//! - Domain types (market indices, data sources, canonical records)
//! - Providers for the daily time-series API and Yahoo CSV exports
//! - Normalization of both raw shapes into one document shape
//! - The ingest driver (reset once, six sequential jobs, failure policy)
//! - A SQLite document store acting as the storage sink
//! - A query layer over the loaded collections
//! - Config and logging setup

pub mod config;
pub mod data;
pub mod domain;
pub mod logging;
pub mod query;
pub mod store;
