//! Webhook notifier.
//!
//! POSTs the alert as JSON to a configured URL, for SMS/email relays and
//! chat integrations. When a shared secret is set the body is signed with
//! HMAC-SHA256 and the digest sent as `X-Nomi-Signature: sha256=<hex>`.

use std::time::Duration;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use nomi_core::analysis::AlertEvent;
use nomi_core::error::NotifyError;
use nomi_core::notifier::Notifier;
use sha2::Sha256;
use tracing::{debug, info};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the payload signature.
pub const SIGNATURE_HEADER: &str = "X-Nomi-Signature";

/// Webhook notifier configuration.
#[derive(Clone)]
pub struct WebhookConfig {
    pub url: String,
    /// HMAC shared secret. None or empty = unsigned.
    pub shared_secret: Option<String>,
    pub timeout_secs: u64,
}

impl WebhookConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            shared_secret: None,
            timeout_secs: 10,
        }
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.shared_secret = Some(secret.into());
        self
    }
}

impl std::fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("url", &self.url)
            .field(
                "shared_secret",
                &self.shared_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

pub struct WebhookNotifier {
    config: WebhookConfig,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(config: WebhookConfig) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| NotifyError::NotConfigured(format!("HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    fn secret(&self) -> Option<&str> {
        self.config
            .shared_secret
            .as_deref()
            .filter(|s| !s.is_empty())
    }

    fn failed(&self, reason: impl Into<String>) -> NotifyError {
        NotifyError::DeliveryFailed {
            channel: format!("webhook {}", self.config.url),
            reason: reason.into(),
        }
    }
}

/// Sign `payload` with `secret`, formatted as `sha256=<hex>`.
pub fn sign(secret: &str, payload: &[u8]) -> Result<String, NotifyError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| NotifyError::NotConfigured(format!("HMAC key: {e}")))?;
    mac.update(payload);
    Ok(format!("sha256={}", hex::encode(mac.finalize().into_bytes())))
}

/// Check a signature produced by [`sign`], in constant time.
///
/// Accepts `sha256=<hex>` or bare `<hex>`.
pub fn verify_signature(secret: &str, payload: &[u8], signature: &str) -> bool {
    let sig_hex = signature.strip_prefix("sha256=").unwrap_or(signature);
    let Ok(provided) = hex::decode(sig_hex) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(payload);
    mac.verify_slice(&provided).is_ok()
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn notify(&self, event: &AlertEvent) -> Result<(), NotifyError> {
        let body = serde_json::to_vec(event).map_err(|e| self.failed(e.to_string()))?;

        let mut request = self
            .client
            .post(&self.config.url)
            .header("Content-Type", "application/json");
        if let Some(secret) = self.secret() {
            request = request.header(SIGNATURE_HEADER, sign(secret, &body)?);
        }

        debug!(url = %self.config.url, alert_id = %event.id, "Posting alert webhook");
        let response = request
            .body(body)
            .send()
            .await
            .map_err(|e| self.failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(self.failed(format!("status {}: {text}", status.as_u16())));
        }

        info!(url = %self.config.url, alert_id = %event.id, "Alert delivered via webhook");
        Ok(())
    }
}
