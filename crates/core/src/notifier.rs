//! Notifier trait — the abstraction over alert delivery channels.
//!
//! A Notifier takes an [`AlertEvent`] and makes a best-effort attempt to get
//! it in front of a caregiver (SMS bridge, email relay, chat webhook, logs).
//! Failures are reported as values; callers log them and move on.

use async_trait::async_trait;

use crate::analysis::AlertEvent;
use crate::error::NotifyError;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Human-readable channel name (e.g., "log", "webhook").
    fn name(&self) -> &str;

    /// Attempt delivery of one alert.
    async fn notify(&self, event: &AlertEvent) -> Result<(), NotifyError>;

    /// Health check — is the channel usable?
    async fn health_check(&self) -> Result<bool, NotifyError> {
        Ok(true)
    }
}
