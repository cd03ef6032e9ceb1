//! Shared test helpers for index and retriever tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use nomi_core::error::{FetchError, ProviderError};
use nomi_core::history::HistorySource;
use nomi_core::provider::{
    EmbeddingInputType, EmbeddingRequest, EmbeddingResponse, Provider, ProviderRequest, ProviderResponse,
};
use nomi_core::record::SensorRecord;

pub const DIM: usize = 32;

/// Deterministic bag-of-words embedder.
///
/// Each lowercase alphanumeric token is hashed into one of `DIM` buckets,
/// so texts sharing words land close together.
pub struct HashingEmbedder {
    batches: Mutex<Vec<usize>>,
    input_types: Mutex<Vec<Option<EmbeddingInputType>>>,
}

impl HashingEmbedder {
    pub fn new() -> Self {
        Self {
            batches: Mutex::new(Vec::new()),
            input_types: Mutex::new(Vec::new()),
        }
    }

    /// Sizes of every embedding request received, in order.
    pub fn batches(&self) -> Vec<usize> {
        self.batches.lock().unwrap().clone()
    }

    /// The `input_type` of every embedding request received, in order.
    pub fn input_types(&self) -> Vec<Option<EmbeddingInputType>> {
        self.input_types.lock().unwrap().clone()
    }
}

pub fn embed_text(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; DIM];
    for token in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        let token = token.to_lowercase();
        let mut h: u32 = 2166136261;
        for b in token.bytes() {
            h ^= b as u32;
            h = h.wrapping_mul(16777619);
        }
        v[(h as usize) % DIM] += 1.0;
    }
    v
}

#[async_trait]
impl Provider for HashingEmbedder {
    fn name(&self) -> &str {
        "hashing_mock"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(ProviderError::NotConfigured("embedding-only mock".into()))
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
        self.batches.lock().unwrap().push(request.inputs.len());
        self.input_types.lock().unwrap().push(request.input_type);
        Ok(EmbeddingResponse {
            embeddings: request.inputs.iter().map(|t| embed_text(t)).collect(),
            model: request.model,
            usage: None,
        })
    }
}

/// An embedder that returns a canned (possibly malformed) response.
pub struct CannedEmbedder {
    pub embeddings: Vec<Vec<f32>>,
}

#[async_trait]
impl Provider for CannedEmbedder {
    fn name(&self) -> &str {
        "canned_mock"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(ProviderError::NotConfigured("embedding-only mock".into()))
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
        Ok(EmbeddingResponse {
            embeddings: self.embeddings.clone(),
            model: request.model,
            usage: None,
        })
    }
}

/// A history source that counts fetches and can be swapped out mid-test.
pub struct CountingSource {
    records: Mutex<Vec<SensorRecord>>,
    fetches: AtomicUsize,
}

impl CountingSource {
    pub fn new(records: Vec<SensorRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn set(&self, records: Vec<SensorRecord>) {
        *self.records.lock().unwrap() = records;
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HistorySource for CountingSource {
    fn name(&self) -> &str {
        "counting"
    }

    async fn fetch(&self) -> Result<Vec<SensorRecord>, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.lock().unwrap().clone())
    }
}

pub fn sample_history() -> Vec<SensorRecord> {
    let mut records = vec![
        SensorRecord::reading("heart_rate", 72),
        SensorRecord::reading("sleep", "7 hours, woke twice"),
        SensorRecord::reading("eating", "skipped breakfast"),
    ];
    records[0].notes = Some("resting pulse steady".into());
    records[2].notes = Some("appetite low".into());
    records
}
