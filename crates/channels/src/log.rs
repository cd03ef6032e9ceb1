//! Log notifier — writes alerts to the structured log.
//!
//! Always available, so an alert is never silently lost even when no
//! outbound channel is configured.

use async_trait::async_trait;
use nomi_core::analysis::AlertEvent;
use nomi_core::error::NotifyError;
use nomi_core::notifier::Notifier;
use tracing::warn;

#[derive(Debug, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn notify(&self, event: &AlertEvent) -> Result<(), NotifyError> {
        warn!(
            alert_id = %event.id,
            subject = %event.subject,
            keywords = ?event.matched_keywords,
            raised_at = %event.raised_at,
            message = %event.message,
            "Emergency alert raised"
        );
        Ok(())
    }
}
