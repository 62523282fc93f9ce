//! The tracked market indices and where their data comes from.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the three tracked market indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketIndex {
    Sp500,
    Dow,
    Nasdaq,
}

impl MarketIndex {
    /// All indices, in load order.
    pub const ALL: [MarketIndex; 3] = [MarketIndex::Sp500, MarketIndex::Dow, MarketIndex::Nasdaq];

    /// Collection base name (before any source suffix).
    pub fn collection_base(self) -> &'static str {
        match self {
            MarketIndex::Sp500 => "sp_500",
            MarketIndex::Dow => "dow",
            MarketIndex::Nasdaq => "nasdaq",
        }
    }

    /// Symbol sent to the daily time-series API.
    pub fn api_symbol(self) -> &'static str {
        match self {
            MarketIndex::Sp500 => "INX",
            MarketIndex::Dow => "DJI",
            MarketIndex::Nasdaq => "NDAQ",
        }
    }

    /// Symbol the query surface reports and accepts.
    pub fn market_symbol(self) -> &'static str {
        match self {
            MarketIndex::Sp500 => "INX",
            MarketIndex::Dow => "DJIA",
            MarketIndex::Nasdaq => "IXIC",
        }
    }

    /// CSV file name holding the exported series.
    pub fn csv_file(self) -> &'static str {
        match self {
            MarketIndex::Sp500 => "sp_500.csv",
            MarketIndex::Dow => "dow.csv",
            MarketIndex::Nasdaq => "nasdaq.csv",
        }
    }

    /// Human-readable name used in progress markers.
    pub fn display_name(self) -> &'static str {
        match self {
            MarketIndex::Sp500 => "SP 500",
            MarketIndex::Dow => "DOW",
            MarketIndex::Nasdaq => "NASDAQ",
        }
    }

    /// Collection that holds this index's records from `source`.
    pub fn collection(self, source: DataSource) -> String {
        format!("{}{}", self.collection_base(), source.collection_suffix())
    }

    /// Look up an index by collection base name, market symbol or API symbol.
    ///
    /// Matching is exact (case-sensitive).
    pub fn resolve(input: &str) -> Option<MarketIndex> {
        Self::ALL.into_iter().find(|index| {
            index.collection_base() == input
                || index.market_symbol() == input
                || index.api_symbol() == input
        })
    }
}

impl fmt::Display for MarketIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Where a batch of records came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// Daily time-series HTTP API.
    Api,
    /// Yahoo-exported CSV file.
    File,
}

impl DataSource {
    pub fn collection_suffix(self) -> &'static str {
        match self {
            DataSource::Api => "",
            DataSource::File => "_yahoo",
        }
    }

    /// Label used in progress markers.
    pub fn label(self) -> &'static str {
        match self {
            DataSource::Api => "API",
            DataSource::File => "Yahoo",
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
