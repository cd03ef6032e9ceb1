//! Historical data source trait.
//!
//! The source is the ground truth the semantic index is rebuilt from, and
//! the fallback for requests that arrive without readings.

use async_trait::async_trait;

use crate::error::FetchError;
use crate::record::SensorRecord;

#[async_trait]
pub trait HistorySource: Send + Sync {
    /// A short name for logs (e.g., "http", "file").
    fn name(&self) -> &str;

    /// Fetch every available record, oldest first.
    async fn fetch(&self) -> Result<Vec<SensorRecord>, FetchError>;
}
