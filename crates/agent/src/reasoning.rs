//! Reasoning client — one prompt in, one completion out.
//!
//! No retries: a failed call fails the analysis.

use std::sync::Arc;

use nomi_config::ReasoningConfig;
use nomi_core::error::Error;
use nomi_core::message::Message;
use nomi_core::provider::{Provider, ProviderRequest};
use tracing::debug;

pub struct ReasoningClient {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl ReasoningClient {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        temperature: f32,
        max_tokens: u32,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
            max_tokens,
        }
    }

    pub fn from_config(provider: Arc<dyn Provider>, config: &ReasoningConfig) -> Self {
        Self::new(provider, &config.model, config.temperature, config.max_tokens)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    /// Send `prompt` as a single user message with the configured sampling.
    pub async fn complete(&self, prompt: &str) -> Result<String, Error> {
        self.send(prompt, self.temperature, self.max_tokens).await
    }

    /// Plain chat passthrough with caller-chosen sampling.
    pub async fn chat(&self, message: &str, temperature: f32, max_tokens: u32) -> Result<String, Error> {
        self.send(message, temperature, max_tokens).await
    }

    async fn send(&self, content: &str, temperature: f32, max_tokens: u32) -> Result<String, Error> {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages: vec![Message::user(content)],
            temperature,
            max_tokens: Some(max_tokens),
        };

        debug!(
            provider = self.provider.name(),
            model = %self.model,
            prompt_len = content.len(),
            "Calling reasoning model"
        );
        let response = self.provider.complete(request).await?;
        debug!(reply_len = response.message.content.len(), "Reasoning model replied");

        Ok(response.message.content)
    }
}
