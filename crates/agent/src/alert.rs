//! Emergency detection and alert dispatch.
//!
//! An analysis raises at most one alert: when the raw model output
//! mentions any emergency keyword (case-insensitive substring match).

use std::sync::Arc;

use nomi_channels::NotifierRegistry;
use nomi_core::analysis::{AlertEvent, AnalysisResult};
use nomi_core::error::NotifyError;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Phrases in model output that indicate a medical emergency.
pub const EMERGENCY_KEYWORDS: [&str; 7] = [
    "fall",
    "unconscious",
    "critical",
    "abnormal",
    "emergency",
    "not breathing",
    "low oxygen",
];

pub const ALERT_SUBJECT: &str = "🚨 Emergency Detected by NOMI";

/// The emergency keywords present in `raw`, in keyword-list order.
pub fn matched_keywords(raw: &str) -> Vec<String> {
    let lower = raw.to_lowercase();
    EMERGENCY_KEYWORDS
        .iter()
        .filter(|k| lower.contains(*k))
        .map(|k| k.to_string())
        .collect()
}

/// Build the alert for one analysis, if its raw output warrants one.
pub fn build_alert(raw: &str, result: &AnalysisResult) -> Option<AlertEvent> {
    let keywords = matched_keywords(raw);
    if keywords.is_empty() {
        return None;
    }

    let summary = if result.summary.is_empty() {
        raw.trim()
    } else {
        result.summary.as_str()
    };
    let message = format!(
        "🚨 NOMI Alert:\n{summary}\n\nRecommendation: {}",
        result.recommendation
    );

    Some(AlertEvent::new(ALERT_SUBJECT, message, keywords))
}

/// Delivers alerts through the registered notifiers.
#[derive(Clone)]
pub struct AlertDispatcher {
    notifiers: Arc<NotifierRegistry>,
}

impl AlertDispatcher {
    pub fn new(notifiers: Arc<NotifierRegistry>) -> Self {
        Self { notifiers }
    }

    pub fn notifiers(&self) -> &NotifierRegistry {
        &self.notifiers
    }

    /// Deliver `event` to every notifier and report any failures.
    pub async fn deliver(&self, event: &AlertEvent) -> Result<(), NotifyError> {
        info!(
            alert_id = %event.id,
            keywords = ?event.matched_keywords,
            notifiers = self.notifiers.len(),
            "Dispatching emergency alert"
        );
        self.notifiers.notify_all(event).await
    }

    /// Deliver in the background. Failures are logged, never returned.
    pub fn spawn(&self, event: AlertEvent) -> JoinHandle<()> {
        let dispatcher = self.clone();
        tokio::spawn(async move {
            if let Err(e) = dispatcher.deliver(&event).await {
                warn!(alert_id = %event.id, error = %e, "Alert delivery failed");
            }
        })
    }
}
