//! Lazily-initialized embedding handle.
//!
//! The backing provider is constructed on first use and then shared for
//! the life of the process. Concurrent first calls wait on the same
//! initialization; a failed initialization is retried on the next call.

use std::fmt;
use std::sync::Arc;

use nomi_core::error::{Error, IndexError, ProviderError};
use nomi_core::provider::{EmbeddingInputType, EmbeddingRequest, Provider};
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Builds the embedding provider. Called at most once per successful init.
pub type ProviderFactory = Box<dyn Fn() -> Result<Arc<dyn Provider>, Error> + Send + Sync>;

pub struct EmbeddingHandle {
    factory: ProviderFactory,
    provider: OnceCell<Arc<dyn Provider>>,
    model: String,
    batch_size: usize,
}

impl EmbeddingHandle {
    pub fn new<F>(model: impl Into<String>, batch_size: usize, factory: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn Provider>, Error> + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            provider: OnceCell::new(),
            model: model.into(),
            batch_size: batch_size.max(1),
        }
    }

    /// Wrap an already-built provider.
    pub fn from_provider(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        batch_size: usize,
    ) -> Self {
        Self::new(model, batch_size, move || Ok(provider.clone()))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn is_initialized(&self) -> bool {
        self.provider.initialized()
    }

    /// The provider, constructing it on first call.
    pub async fn provider(&self) -> Result<&Arc<dyn Provider>, Error> {
        self.provider
            .get_or_try_init(|| async {
                let provider = (self.factory)()?;
                info!(provider = provider.name(), model = %self.model, "Embedding provider initialized");
                Ok::<_, Error>(provider)
            })
            .await
    }

    /// Embed passages for the index, in order, one vector per text.
    pub async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, Error> {
        self.embed_as(texts, EmbeddingInputType::Passage).await
    }

    /// Embed a single search query.
    pub async fn embed_query(&self, text: &str) -> Result<Vec<f32>, Error> {
        let mut vectors = self
            .embed_as(&[text.to_string()], EmbeddingInputType::Query)
            .await?;
        vectors
            .pop()
            .ok_or_else(|| IndexError::EmbeddingFailed("no vector returned".into()).into())
    }

    async fn embed_as(
        &self,
        texts: &[String],
        input_type: EmbeddingInputType,
    ) -> Result<Vec<Vec<f32>>, Error> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let provider = self.provider().await?;
        let mut vectors = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.batch_size) {
            debug!(batch = batch.len(), "Requesting embeddings");
            let response = provider
                .embed(EmbeddingRequest {
                    model: self.model.clone(),
                    inputs: batch.to_vec(),
                    input_type: Some(input_type),
                })
                .await
                .map_err(embedding_error)?;

            if response.embeddings.len() != batch.len() {
                return Err(IndexError::EmbeddingFailed(format!(
                    "expected {} vectors, got {}",
                    batch.len(),
                    response.embeddings.len()
                ))
                .into());
            }
            if response.embeddings.iter().any(Vec::is_empty) {
                return Err(IndexError::EmbeddingFailed("empty embedding vector".into()).into());
            }

            vectors.extend(response.embeddings);
        }

        Ok(vectors)
    }
}

impl fmt::Debug for EmbeddingHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddingHandle")
            .field("model", &self.model)
            .field("batch_size", &self.batch_size)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

fn embedding_error(err: ProviderError) -> Error {
    match err {
        ProviderError::NotConfigured(message) => Error::Config { message },
        other => IndexError::EmbeddingFailed(other.to_string()).into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{CannedEmbedder, DIM, HashingEmbedder};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn texts(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("reading {i}")).collect()
    }

    #[tokio::test]
    async fn embeds_in_batches_preserving_order() {
        let mock = Arc::new(HashingEmbedder::new());
        let handle = EmbeddingHandle::from_provider(mock.clone(), "test-embed", 4);

        let input = texts(10);
        let vectors = handle.embed(&input).await.unwrap();

        assert_eq!(vectors.len(), 10);
        assert!(vectors.iter().all(|v| v.len() == DIM));
        assert_eq!(mock.batches(), vec![4, 4, 2]);
        assert!(
            mock.input_types()
                .iter()
                .all(|t| *t == Some(EmbeddingInputType::Passage))
        );
        assert_eq!(vectors[7], crate::test_helpers::embed_text("reading 7"));
    }

    #[tokio::test]
    async fn queries_are_marked_as_queries() {
        let mock = Arc::new(HashingEmbedder::new());
        let handle = EmbeddingHandle::from_provider(mock.clone(), "test-embed", 4);

        handle.embed(&texts(2)).await.unwrap();
        handle.embed_query("fall in bathroom").await.unwrap();

        assert_eq!(
            mock.input_types(),
            vec![Some(EmbeddingInputType::Passage), Some(EmbeddingInputType::Query)]
        );
    }

    #[tokio::test]
    async fn empty_input_skips_provider() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let handle = EmbeddingHandle::new("m", 8, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(HashingEmbedder::new()) as Arc<dyn Provider>)
        });

        assert!(handle.embed(&[]).await.unwrap().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!handle.is_initialized());
    }

    #[tokio::test]
    async fn concurrent_first_use_builds_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let handle = Arc::new(EmbeddingHandle::new("m", 8, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(HashingEmbedder::new()) as Arc<dyn Provider>)
        }));

        let mut tasks = Vec::new();
        for i in 0..8 {
            let handle = handle.clone();
            tasks.push(tokio::spawn(async move {
                handle.embed_query(&format!("text {i}")).await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(handle.is_initialized());
    }

    #[tokio::test]
    async fn failed_init_is_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let handle = EmbeddingHandle::new("m", 8, move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(Error::config("NGC_API_KEY is not set"))
            } else {
                Ok(Arc::new(HashingEmbedder::new()) as Arc<dyn Provider>)
            }
        });

        let first = handle.embed_query("x").await;
        assert!(matches!(first, Err(Error::Config { .. })));
        assert!(!handle.is_initialized());

        handle.embed_query("x").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn count_mismatch_is_index_error() {
        let mock = Arc::new(CannedEmbedder {
            embeddings: vec![vec![1.0, 0.0]],
        });
        let handle = EmbeddingHandle::from_provider(mock, "m", 8);

        let err = handle.embed(&texts(2)).await.unwrap_err();
        assert!(matches!(err, Error::Index(IndexError::EmbeddingFailed(_))));
        assert!(err.to_string().contains("expected 2 vectors, got 1"));
    }

    #[tokio::test]
    async fn empty_vector_is_index_error() {
        let mock = Arc::new(CannedEmbedder {
            embeddings: vec![vec![]],
        });
        let handle = EmbeddingHandle::from_provider(mock, "m", 8);

        let err = handle.embed_query("x").await.unwrap_err();
        assert!(matches!(err, Error::Index(IndexError::EmbeddingFailed(_))));
    }

    #[tokio::test]
    async fn provider_without_embeddings_is_config_error() {
        struct ChatOnly;

        #[async_trait::async_trait]
        impl Provider for ChatOnly {
            fn name(&self) -> &str {
                "chat_only"
            }

            async fn complete(
                &self,
                _request: nomi_core::provider::ProviderRequest,
            ) -> Result<nomi_core::provider::ProviderResponse, ProviderError> {
                Err(ProviderError::Network("unused".into()))
            }
        }

        let handle = EmbeddingHandle::from_provider(Arc::new(ChatOnly), "m", 8);
        let err = handle.embed_query("x").await.unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn debug_output_mentions_model() {
        let handle = EmbeddingHandle::from_provider(Arc::new(HashingEmbedder::new()), "nv-embed", 0);
        let dbg = format!("{handle:?}");
        assert!(dbg.contains("nv-embed"));
        assert!(dbg.contains("batch_size: 1"));
    }
}
