//! Alert notifier implementations for NOMI.
//!
//! Each notifier delivers an [`AlertEvent`](nomi_core::analysis::AlertEvent)
//! over one channel. Notifiers are trait-based; the registry fans an alert
//! out to all of them.
//!
//! Available notifiers:
//! - **Log** — structured `tracing` warning
//! - **Webhook** — JSON POST with optional HMAC-SHA256 signature
//! - **Registry** — ordered fan-out over the configured notifiers

pub mod log;
pub mod registry;
pub mod webhook;

pub use log::LogNotifier;
pub use registry::NotifierRegistry;
pub use webhook::{WebhookConfig, WebhookNotifier};
