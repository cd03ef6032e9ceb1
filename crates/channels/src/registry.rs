//! Notifier registry — fans one alert out to every configured channel.

use std::sync::Arc;

use nomi_config::AlertsConfig;
use nomi_core::analysis::AlertEvent;
use nomi_core::error::NotifyError;
use nomi_core::notifier::Notifier;
use tracing::{debug, info, warn};

use crate::log::LogNotifier;
use crate::webhook::{WebhookConfig, WebhookNotifier};

/// Ordered set of notifiers. The same channel kind may appear more than
/// once (e.g., several webhooks).
#[derive(Default)]
pub struct NotifierRegistry {
    notifiers: Vec<Arc<dyn Notifier>>,
}

impl NotifierRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            notifiers: Vec::new(),
        }
    }

    /// Build the registry described by the `[alerts]` config section.
    pub fn from_config(config: &AlertsConfig) -> Result<Self, NotifyError> {
        let mut registry = Self::new();
        if !config.enabled {
            info!("Alert delivery disabled");
            return Ok(registry);
        }
        if config.log {
            registry.register(Arc::new(LogNotifier::new()));
        }
        for target in &config.webhooks {
            let mut webhook = WebhookConfig::new(&target.url);
            webhook.shared_secret = target.secret.clone();
            registry.register(Arc::new(WebhookNotifier::new(webhook)?));
        }
        Ok(registry)
    }

    /// Register a notifier.
    pub fn register(&mut self, notifier: Arc<dyn Notifier>) {
        info!(notifier = %notifier.name(), "Registered notifier");
        self.notifiers.push(notifier);
    }

    /// Names of all registered notifiers, in registration order.
    pub fn list(&self) -> Vec<String> {
        self.notifiers.iter().map(|n| n.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }

    /// Deliver `event` through every notifier.
    ///
    /// Every notifier is attempted even if an earlier one fails; the
    /// failures are returned together.
    pub async fn notify_all(&self, event: &AlertEvent) -> Result<(), NotifyError> {
        if self.notifiers.is_empty() {
            debug!(alert_id = %event.id, "No notifiers registered, alert dropped");
            return Ok(());
        }

        let mut failures = Vec::new();
        for notifier in &self.notifiers {
            if let Err(e) = notifier.notify(event).await {
                warn!(notifier = %notifier.name(), alert_id = %event.id, error = %e, "Notifier failed");
                failures.push(e);
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(NotifyError::Partial {
                attempted: self.notifiers.len(),
                failures,
            })
        }
    }

    /// Run health checks on all notifiers.
    pub async fn health_check_all(&self) -> Vec<(String, bool)> {
        let mut results = Vec::with_capacity(self.notifiers.len());
        for notifier in &self.notifiers {
            let healthy = notifier.health_check().await.unwrap_or(false);
            results.push((notifier.name().to_string(), healthy));
        }
        results
    }
}
