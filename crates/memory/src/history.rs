//! History source implementations.
//!
//! All sources accept the same payload shape: one record object or a JSON
//! array of them. Within an array, rows that are not valid records are
//! skipped with a warning; the rest of the history still reaches the index.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use nomi_core::error::FetchError;
use nomi_core::history::HistorySource;
use nomi_core::record::SensorRecord;
use serde_json::Value;
use tracing::{debug, warn};

pub(crate) fn parse_payload(value: Value) -> Result<Vec<SensorRecord>, FetchError> {
    let rows = match value {
        Value::Array(rows) => rows,
        other => {
            return SensorRecord::many_from_json(other)
                .map_err(|e| FetchError::InvalidPayload(e.to_string()));
        }
    };

    let total = rows.len();
    let mut records = Vec::with_capacity(total);
    let mut last_error = None;
    for (row, item) in rows.into_iter().enumerate() {
        match serde_json::from_value::<SensorRecord>(item) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!(row, error = %e, "Skipping invalid history row");
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(e) if records.is_empty() => Err(FetchError::InvalidPayload(format!(
            "none of {total} row(s) is a valid record: {e}"
        ))),
        _ => Ok(records),
    }
}

/// Fetches records with a plain `GET` from the upstream data service.
pub struct HttpHistorySource {
    url: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl HttpHistorySource {
    pub fn new(url: impl Into<String>, timeout_secs: u64) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| FetchError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            url: url.into(),
            timeout_secs,
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl HistorySource for HttpHistorySource {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self) -> Result<Vec<SensorRecord>, FetchError> {
        debug!(url = %self.url, "Fetching history");

        let response = self.client.get(&self.url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    timeout_secs: self.timeout_secs,
                }
            } else {
                FetchError::Unreachable(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status_code: status.as_u16(),
                message,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| FetchError::InvalidPayload(e.to_string()))?;
        parse_payload(body)
    }
}

/// Reads records from a JSON file on every fetch.
pub struct FileHistorySource {
    path: PathBuf,
}

impl FileHistorySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl HistorySource for FileHistorySource {
    fn name(&self) -> &str {
        "file"
    }

    async fn fetch(&self) -> Result<Vec<SensorRecord>, FetchError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| FetchError::Unreachable(format!("{}: {e}", self.path.display())))?;
        let value: Value = serde_json::from_str(&content)
            .map_err(|e| FetchError::InvalidPayload(format!("{}: {e}", self.path.display())))?;
        parse_payload(value)
    }
}

/// Serves a fixed set of records.
#[derive(Debug, Clone, Default)]
pub struct StaticHistorySource {
    records: Vec<SensorRecord>,
}

impl StaticHistorySource {
    pub fn new(records: Vec<SensorRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl HistorySource for StaticHistorySource {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch(&self) -> Result<Vec<SensorRecord>, FetchError> {
        Ok(self.records.clone())
    }
}
