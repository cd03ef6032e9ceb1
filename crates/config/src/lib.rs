//! Configuration loading, validation, and management for NOMI.
//!
//! Loads configuration from `~/.nomi/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.nomi/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Language-model backend used for analysis and chat
    #[serde(default)]
    pub reasoning: ReasoningConfig,

    /// Embedding backend used to build the semantic index
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Historical sensor data source
    #[serde(default)]
    pub history: HistoryConfig,

    /// Passage chunking
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Context retrieval
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Emergency alert channels
    #[serde(default)]
    pub alerts: AlertsConfig,

    /// HTTP gateway
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ReasoningConfig {
    /// Base URL of an OpenAI-compatible API (without `/chat/completions`)
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_reasoning_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Overall HTTP timeout for model calls
    #[serde(default = "default_reasoning_timeout")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    "https://integrate.api.nvidia.com/v1".into()
}
fn default_reasoning_model() -> String {
    "meta/llama-3.1-8b-instruct".into()
}
fn default_temperature() -> f32 {
    0.5
}
fn default_max_tokens() -> u32 {
    150
}
fn default_reasoning_timeout() -> u64 {
    120
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: None,
            model: default_reasoning_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_reasoning_timeout(),
        }
    }
}

impl std::fmt::Debug for ReasoningConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReasoningConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Falls back to the reasoning key when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Texts per embedding request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Per-request timeout for embedding calls
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,

    /// Send `input_type` ("passage"/"query") with embedding requests.
    /// Required by NVIDIA retrieval models; turn off for endpoints that
    /// reject unknown fields.
    #[serde(default = "default_true")]
    pub send_input_type: bool,
}

fn default_embedding_model() -> String {
    "nvidia/nv-embed-v1".into()
}
fn default_batch_size() -> usize {
    64
}
fn default_embedding_timeout() -> u64 {
    60
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: None,
            model: default_embedding_model(),
            batch_size: default_batch_size(),
            timeout_secs: default_embedding_timeout(),
            send_input_type: true,
        }
    }
}

impl std::fmt::Debug for EmbeddingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("batch_size", &self.batch_size)
            .field("timeout_secs", &self.timeout_secs)
            .field("send_input_type", &self.send_input_type)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// HTTP endpoint returning one record or an array of records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Local JSON file used instead of `url` when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,

    /// Bounded wait on the historical fetch
    #[serde(default = "default_history_timeout")]
    pub timeout_secs: u64,
}

fn default_history_timeout() -> u64 {
    10
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            url: None,
            file: None,
            timeout_secs: default_history_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_chunk_size() -> usize {
    800
}
fn default_chunk_overlap() -> usize {
    120
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Passages injected into the prompt
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Trailing records used to derive a query when none is given
    #[serde(default = "default_query_window")]
    pub query_window: usize,

    /// Query used when neither the request nor the readings provide one
    #[serde(default = "default_fallback_query")]
    pub fallback_query: String,
}

fn default_top_k() -> usize {
    2
}
fn default_query_window() -> usize {
    5
}
fn default_fallback_query() -> String {
    "recent sensor activity".into()
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            query_window: default_query_window(),
            fallback_query: default_fallback_query(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsConfig {
    /// Master switch for emergency alerts
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Emit alerts as structured log events
    #[serde(default = "default_true")]
    pub log: bool,

    /// Webhook endpoints receiving alert JSON
    #[serde(default)]
    pub webhooks: Vec<WebhookTarget>,
}

fn default_true() -> bool {
    true
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log: true,
            webhooks: Vec::new(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct WebhookTarget {
    pub url: String,

    /// HMAC-SHA256 key used to sign the payload. None = unsigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

impl std::fmt::Debug for WebhookTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookTarget")
            .field("url", &self.url)
            .field("secret", &redact(&self.secret))
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.nomi/config.toml).
    ///
    /// Environment variables override file values:
    /// - `NGC_API_KEY` — reasoning (and embedding, if unset) API key
    /// - `NIM_ENDPOINT` — reasoning API URL
    /// - `NOMI_MODEL` — reasoning model
    /// - `NOMI_EMBEDDING_API_KEY`, `NOMI_EMBEDDING_URL`
    /// - `DYNAMO_API_URL` — historical data endpoint
    /// - `NOMI_ALERT_WEBHOOK` — an extra alert webhook
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(&Self::config_dir().join("config.toml"))
    }

    /// Load from a specific path, then apply process environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides using the given lookup.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = lookup("NGC_API_KEY") {
            self.reasoning.api_key = Some(key);
        }
        if let Some(endpoint) = lookup("NIM_ENDPOINT") {
            self.reasoning.api_url = endpoint
                .trim_end_matches('/')
                .trim_end_matches("/chat/completions")
                .to_string();
        }
        if let Some(model) = lookup("NOMI_MODEL") {
            self.reasoning.model = model;
        }
        if let Some(key) = lookup("NOMI_EMBEDDING_API_KEY") {
            self.embedding.api_key = Some(key);
        }
        if let Some(url) = lookup("NOMI_EMBEDDING_URL") {
            self.embedding.api_url = url.trim_end_matches('/').to_string();
        }
        if let Some(url) = lookup("DYNAMO_API_URL") {
            self.history.url = Some(url);
        }
        if let Some(url) = lookup("NOMI_ALERT_WEBHOOK") {
            self.alerts.webhooks.push(WebhookTarget { url, secret: None });
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".nomi")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.reasoning.temperature) {
            return Err(ConfigError::ValidationError(
                "reasoning.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.reasoning.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "reasoning.max_tokens must be > 0".into(),
            ));
        }

        if self.chunking.chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "chunking.chunk_size must be > 0".into(),
            ));
        }

        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(ConfigError::ValidationError(
                "chunking.chunk_overlap must be smaller than chunking.chunk_size".into(),
            ));
        }

        if self.retrieval.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.top_k must be > 0".into(),
            ));
        }

        if self.reasoning.timeout_secs == 0 || self.embedding.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "reasoning.timeout_secs and embedding.timeout_secs must be > 0".into(),
            ));
        }

        if self.embedding.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.batch_size must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// The key used for embeddings: the dedicated one, else the reasoning key.
    pub fn embedding_api_key(&self) -> Option<&str> {
        self.embedding
            .api_key
            .as_deref()
            .or(self.reasoning.api_key.as_deref())
    }

    /// Generate a default config TOML string (for `nomi config`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
