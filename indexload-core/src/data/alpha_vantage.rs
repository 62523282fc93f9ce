//! Daily time-series HTTP provider (Alpha Vantage `TIME_SERIES_DAILY`).
//!
//! One GET per index with `outputsize=full`. The decoded body must carry a
//! `"Time Series (Daily)"` object mapping dates to labelled OHLC strings.
//!
//! There is no retry: a failed request or an unexpected body fails the job.
//! When the service answers with a notice instead of data (bad key, rate
//! limit), the notice text is carried in the schema error.

use super::normalize::{normalize_api, RawDailySeries};
use super::provider::{DataProvider, IngestError};
use crate::config::ApiConfig;
use crate::domain::{CanonicalRecord, DataSource, MarketIndex};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const SERIES_KEY: &str = "Time Series (Daily)";

/// Top-level keys the service uses to explain a missing series.
const NOTICE_KEYS: [&str; 3] = ["Error Message", "Note", "Information"];

/// HTTP provider for the daily time-series API.
pub struct AlphaVantageProvider {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
}

impl AlphaVantageProvider {
    pub fn new(config: &ApiConfig) -> Result<Self, IngestError> {
        let mut builder = reqwest::blocking::Client::builder()
            .user_agent(concat!("indexload/", env!("CARGO_PKG_VERSION")));
        // reqwest's blocking client defaults to a 30s timeout; the loader waits indefinitely unless configured.
        builder = match config.timeout_secs {
            Some(secs) => builder.timeout(Duration::from_secs(secs)),
            None => builder.timeout(None),
        };
        let client = builder
            .build()
            .map_err(|e| IngestError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self::with_client(client, config))
    }

    /// Use an already configured client.
    fn with_client(client: reqwest::blocking::Client, config: &ApiConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        }
    }

    /// Request the full daily series for one index.
    fn fetch_series(&self, index: MarketIndex) -> Result<RawDailySeries, IngestError> {
        let symbol = index.api_symbol();
        debug!(symbol, endpoint = %self.endpoint, "requesting daily series");

        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("function", "TIME_SERIES_DAILY"),
                ("outputsize", "full"),
                ("symbol", symbol),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            // The URL carries the API key; keep it out of error messages.
            .map_err(|e| IngestError::Transport(format!("request for {symbol} failed: {}", e.without_url())))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(IngestError::Transport(format!("HTTP {status} for {symbol}")));
        }

        let body = resp.text().map_err(|e| {
            IngestError::Transport(format!("reading body for {symbol} failed: {}", e.without_url()))
        })?;

        decode_daily_response(&body)
    }
}

impl DataProvider for AlphaVantageProvider {
    fn name(&self) -> &str {
        "alpha_vantage"
    }

    fn source(&self) -> DataSource {
        DataSource::Api
    }

    fn fetch(&self, index: MarketIndex) -> Result<Vec<CanonicalRecord>, IngestError> {
        let series = self.fetch_series(index)?;
        normalize_api(series)
    }
}

/// Decode a response body into the daily series it carries.
pub fn decode_daily_response(body: &str) -> Result<RawDailySeries, IngestError> {
    let mut value: Value = serde_json::from_str(body)
        .map_err(|e| IngestError::Decode(format!("response is not JSON: {e}")))?;

    let series = match value.get_mut(SERIES_KEY) {
        Some(series) => series.take(),
        None => return Err(IngestError::Schema(missing_series_message(&value))),
    };

    serde_json::from_value(series)
        .map_err(|e| IngestError::Schema(format!("malformed '{SERIES_KEY}': {e}")))
}

fn missing_series_message(value: &Value) -> String {
    let notice = NOTICE_KEYS.iter().find_map(|key| {
        value
            .get(*key)
            .and_then(Value::as_str)
            .map(|text| format!(" ({key}: {text})"))
    });
    format!("response has no '{SERIES_KEY}' field{}", notice.unwrap_or_default())
}
