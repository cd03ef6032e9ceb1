//! Provider factory — builds the configured backends.
//!
//! Missing credentials are a configuration error, reported before any
//! network traffic happens.

use std::sync::Arc;
use std::time::Duration;

use nomi_config::AppConfig;
use nomi_core::error::{Error, ProviderError};
use nomi_core::provider::Provider;

use crate::openai_compat::OpenAiCompatProvider;

/// Build the reasoning (chat completion) provider.
pub fn build_reasoning_provider(config: &AppConfig) -> Result<Arc<dyn Provider>, Error> {
    let api_key = config
        .reasoning
        .api_key
        .as_deref()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| {
            Error::config("no reasoning API key: set NGC_API_KEY or reasoning.api_key")
        })?;

    let provider = OpenAiCompatProvider::with_timeout(
        provider_name(&config.reasoning.api_url),
        &config.reasoning.api_url,
        api_key,
        Duration::from_secs(config.reasoning.timeout_secs),
    )
    .map_err(setup_error("reasoning client"))?;
    Ok(Arc::new(provider))
}

/// Build the embedding provider.
///
/// Uses `embedding.api_key`, falling back to the reasoning key.
pub fn build_embedding_provider(config: &AppConfig) -> Result<Arc<dyn Provider>, Error> {
    Ok(Arc::new(embedding_client(config)?))
}

fn embedding_client(config: &AppConfig) -> Result<OpenAiCompatProvider, Error> {
    let api_key = config
        .embedding_api_key()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| {
            Error::config(
                "no embedding API key: set NOMI_EMBEDDING_API_KEY, NGC_API_KEY or embedding.api_key",
            )
        })?;

    OpenAiCompatProvider::with_timeout(
        provider_name(&config.embedding.api_url),
        &config.embedding.api_url,
        api_key,
        Duration::from_secs(config.embedding.timeout_secs),
    )
    .map(|client| client.with_input_type(config.embedding.send_input_type))
    .map_err(setup_error("embedding client"))
}

/// Client construction failures are setup problems, not upstream errors.
fn setup_error(what: &'static str) -> impl FnOnce(ProviderError) -> Error {
    move |e| Error::config(format!("{what}: {e}"))
}

/// Derive a short provider name from the endpoint host for logs.
fn provider_name(base_url: &str) -> &'static str {
    if base_url.contains("nvidia.com") {
        "nim"
    } else if base_url.contains("openai.com") {
        "openai"
    } else if base_url.contains("openrouter.ai") {
        "openrouter"
    } else if base_url.contains("localhost:11434") {
        "ollama"
    } else {
        "custom"
    }
}
