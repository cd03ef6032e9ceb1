//! In-memory semantic index over history chunks.
//!
//! An index is built once into a fresh value and never mutated afterwards;
//! a refresh produces a new index that replaces the old one wholesale.

use chrono::{DateTime, Utc};
use nomi_core::error::{Error, IndexError};
use serde::Serialize;
use tracing::debug;

use crate::embedder::EmbeddingHandle;
use crate::vector;

/// A chunk and its embedding.
#[derive(Debug, Clone)]
pub struct IndexedChunk {
    pub text: String,
    pub embedding: Vec<f32>,
}

/// One search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub text: String,
    pub score: f32,
}

#[derive(Debug)]
pub struct SemanticIndex {
    entries: Vec<IndexedChunk>,
    dimension: usize,
    built_at: DateTime<Utc>,
}

impl SemanticIndex {
    /// Embed every chunk and assemble a new index in chunk order.
    pub async fn build(chunks: Vec<String>, embedder: &EmbeddingHandle) -> Result<Self, Error> {
        let embeddings = embedder.embed(&chunks).await?;
        let entries = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(text, embedding)| IndexedChunk { text, embedding })
            .collect();
        Ok(Self::from_entries(entries)?)
    }

    /// Assemble an index from pre-computed pairs. All vectors must share
    /// one dimension.
    pub fn from_entries(entries: Vec<IndexedChunk>) -> Result<Self, IndexError> {
        let dimension = entries.first().map(|e| e.embedding.len()).unwrap_or(0);
        if let Some(bad) = entries.iter().find(|e| e.embedding.len() != dimension) {
            return Err(IndexError::DimensionMismatch {
                expected: dimension,
                actual: bad.embedding.len(),
            });
        }

        Ok(Self {
            entries,
            dimension,
            built_at: Utc::now(),
        })
    }

    /// The `k` chunks most similar to `query`, best first. Ties keep
    /// insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<SearchHit> {
        vector::top_k(self.entries.iter().map(|e| e.embedding.as_slice()), query, k)
            .into_iter()
            .map(|(i, score)| SearchHit {
                text: self.entries[i].text.clone(),
                score,
            })
            .collect()
    }

    /// Embed `text` and search for it.
    pub async fn query(
        &self,
        text: &str,
        k: usize,
        embedder: &EmbeddingHandle,
    ) -> Result<Vec<SearchHit>, Error> {
        let query = embedder.embed_query(text).await?;
        if !self.entries.is_empty() && query.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            }
            .into());
        }

        let hits = self.search(&query, k);
        debug!(k, hits = hits.len(), "Semantic index queried");
        Ok(hits)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    pub fn chunks(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.text.as_str())
    }
}
