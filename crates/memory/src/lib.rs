//! Retrieval side of NOMI: record normalization, chunking, embeddings and
//! the in-memory semantic index.

pub mod chunker;
pub mod embedder;
pub mod history;
pub mod index;
pub mod normalizer;
pub mod retriever;
pub mod vector;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use chunker::{Chunker, NO_HISTORY_PLACEHOLDER};
pub use embedder::{EmbeddingHandle, ProviderFactory};
pub use history::{FileHistorySource, HttpHistorySource, StaticHistorySource};
pub use index::{IndexedChunk, SearchHit, SemanticIndex};
pub use normalizer::{normalize, normalize_all};
pub use retriever::{ContextRetriever, IndexStats};
pub use vector::cosine_similarity;
