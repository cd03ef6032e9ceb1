//! Error types for the NOMI domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each collaborator has its own error enum; [`Error`] is what the
//! pipeline surfaces to callers.

use thiserror::Error;

/// The top-level error type for all pipeline operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Missing credentials / invalid settings ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Historical data source ---
    #[error("Upstream fetch failed: {0}")]
    UpstreamFetch(#[from] FetchError),

    // --- Language model backend ---
    #[error("Reasoning service error: {0}")]
    Reasoning(#[from] ProviderError),

    // --- Embedding / semantic index ---
    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Shorthand for a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Collaborator errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider (status: 429), retry after {retry_after_secs}s: {message}")]
    RateLimited {
        retry_after_secs: u64,
        message: String,
    },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Data source not configured: {0}")]
    NotConfigured(String),

    #[error("Data source unreachable: {0}")]
    Unreachable(String),

    #[error("Data source returned status {status_code}: {message}")]
    Status { status_code: u16, message: String },

    #[error("Data source timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Invalid data source payload: {0}")]
    InvalidPayload(String),
}

#[derive(Debug, Clone, Error)]
pub enum IndexError {
    #[error("Embedding generation failed: {0}")]
    EmbeddingFailed(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notifier not configured: {0}")]
    NotConfigured(String),

    #[error("Alert delivery failed via {channel}: {reason}")]
    DeliveryFailed { channel: String, reason: String },

    #[error("{} of {attempted} notifier(s) failed: {}", .failures.len(), .failures.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    Partial {
        attempted: usize,
        failures: Vec<NotifyError>,
    },
}
