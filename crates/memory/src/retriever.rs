//! Context retriever — owns the published semantic index.
//!
//! The index is built lazily on first retrieval and reused until
//! [`ContextRetriever::refresh`] rebuilds it from the history source.
//! Builds are serialized by `build_lock`; readers only ever see a finished
//! index, swapped in as a single `Arc`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use nomi_core::error::Error;
use nomi_core::history::HistorySource;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::chunker::Chunker;
use crate::embedder::EmbeddingHandle;
use crate::index::SemanticIndex;
use crate::normalizer::normalize_all;

/// Snapshot of the published index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    pub built: bool,
    pub chunks: usize,
    pub dimension: usize,
    pub built_at: Option<DateTime<Utc>>,
}

impl IndexStats {
    fn of(index: &SemanticIndex) -> Self {
        Self {
            built: true,
            chunks: index.len(),
            dimension: index.dimension(),
            built_at: Some(index.built_at()),
        }
    }
}

pub struct ContextRetriever {
    embedder: Arc<EmbeddingHandle>,
    source: Arc<dyn HistorySource>,
    chunker: Chunker,
    index: RwLock<Option<Arc<SemanticIndex>>>,
    build_lock: Mutex<()>,
}

impl ContextRetriever {
    pub fn new(
        embedder: Arc<EmbeddingHandle>,
        source: Arc<dyn HistorySource>,
        chunker: Chunker,
    ) -> Self {
        Self {
            embedder,
            source,
            chunker,
            index: RwLock::new(None),
            build_lock: Mutex::new(()),
        }
    }

    pub fn embedder(&self) -> &Arc<EmbeddingHandle> {
        &self.embedder
    }

    pub fn source(&self) -> &Arc<dyn HistorySource> {
        &self.source
    }

    /// The `k` history passages most relevant to `query`, best first.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<String>, Error> {
        let index = self.index().await?;
        let hits = index.query(query, k, &self.embedder).await?;
        Ok(hits.into_iter().map(|hit| hit.text).collect())
    }

    /// The published index, building it first if there is none.
    pub async fn index(&self) -> Result<Arc<SemanticIndex>, Error> {
        if let Some(index) = self.current().await {
            return Ok(index);
        }

        let _guard = self.build_lock.lock().await;
        // Another task may have finished a build while we waited.
        if let Some(index) = self.current().await {
            return Ok(index);
        }

        let index = Arc::new(self.build().await?);
        *self.index.write().await = Some(index.clone());
        Ok(index)
    }

    /// Rebuild from the history source and publish the result.
    ///
    /// On failure the previous index stays in place.
    pub async fn refresh(&self) -> Result<IndexStats, Error> {
        let _guard = self.build_lock.lock().await;
        let index = Arc::new(self.build().await?);
        let stats = IndexStats::of(&index);
        *self.index.write().await = Some(index);
        Ok(stats)
    }

    pub async fn stats(&self) -> IndexStats {
        self.current()
            .await
            .map(|index| IndexStats::of(&index))
            .unwrap_or_default()
    }

    async fn current(&self) -> Option<Arc<SemanticIndex>> {
        self.index.read().await.clone()
    }

    async fn build(&self) -> Result<SemanticIndex, Error> {
        let records = self.source.fetch().await?;
        debug!(source = self.source.name(), records = records.len(), "Fetched history");

        let chunks = self.chunker.split(&normalize_all(&records));
        let index = SemanticIndex::build(chunks, &self.embedder).await?;

        info!(
            records = records.len(),
            chunks = index.len(),
            dimension = index.dimension(),
            "Semantic index built"
        );
        Ok(index)
    }
}
