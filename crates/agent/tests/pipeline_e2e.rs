//! End-to-end pipeline tests with in-process mock backends.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use nomi_agent::{
    AlertDispatcher, AnalysisPipeline, ParseStep, PromptMode, ReasoningClient, ALERT_SUBJECT,
};
use nomi_channels::NotifierRegistry;
use nomi_config::RetrievalConfig;
use nomi_core::analysis::{AlertEvent, AnalysisRequest};
use nomi_core::error::{FetchError, NotifyError, ProviderError};
use nomi_core::history::HistorySource;
use nomi_core::message::Message;
use nomi_core::notifier::Notifier;
use nomi_core::provider::{
    EmbeddingRequest, EmbeddingResponse, Provider, ProviderRequest, ProviderResponse,
};
use nomi_core::record::SensorRecord;
use nomi_memory::{Chunker, ContextRetriever, EmbeddingHandle};

const DIM: usize = 64;

fn embed_text(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; DIM];
    for token in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        let mut h: u32 = 2166136261;
        for b in token.to_lowercase().bytes() {
            h ^= b as u32;
            h = h.wrapping_mul(16777619);
        }
        v[(h as usize) % DIM] += 1.0;
    }
    v
}

/// Answers every completion with the same text and records the prompts.
struct MockModel {
    reply: String,
    prompts: Mutex<Vec<String>>,
}

impl MockModel {
    fn new(reply: &str) -> Self {
        Self {
            reply: reply.into(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for MockModel {
    fn name(&self) -> &str {
        "mock_model"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let prompt = request
            .messages
            .first()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.prompts.lock().unwrap().push(prompt);
        Ok(ProviderResponse {
            message: Message::assistant(self.reply.clone()),
            usage: None,
            model: request.model,
        })
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
        Ok(EmbeddingResponse {
            embeddings: request.inputs.iter().map(|t| embed_text(t)).collect(),
            model: request.model,
            usage: None,
        })
    }
}

struct Inbox {
    events: Mutex<Vec<AlertEvent>>,
}

#[async_trait]
impl Notifier for Inbox {
    fn name(&self) -> &str {
        "inbox"
    }

    async fn notify(&self, event: &AlertEvent) -> Result<(), NotifyError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

struct History {
    records: Vec<SensorRecord>,
    fetches: AtomicUsize,
}

#[async_trait]
impl HistorySource for History {
    fn name(&self) -> &str {
        "fixture"
    }

    async fn fetch(&self) -> Result<Vec<SensorRecord>, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.clone())
    }
}

fn history_fixture() -> Vec<SensorRecord> {
    let rows = serde_json::json!([
        {"timestamp": "2025-03-01T07:00:00Z", "patient_id": "p-1", "sensor_type": "heart_rate", "value": 72, "notes": "resting"},
        {"timestamp": "2025-03-01T08:10:00Z", "patient_id": "p-1", "sensor_type": "meds", "value": "taken", "notes": "morning dose with breakfast"},
        {"timestamp": "2025-03-01T12:30:00Z", "patient_id": "p-1", "sensor_type": "eating", "value": "lunch", "notes": "ate half the meal"},
        {"timestamp": "2025-03-01T15:45:00Z", "patient_id": "p-1", "sensor_type": "fall_detector", "value": false, "notes": "near fall in hallway, recovered"},
        {"timestamp": "2025-03-01T22:00:00Z", "patient_id": "p-1", "sensor_type": "sleep", "value": "in bed", "notes": "restless"}
    ]);
    SensorRecord::many_from_json(rows).unwrap()
}

struct Setup {
    pipeline: Arc<AnalysisPipeline>,
    model: Arc<MockModel>,
    inbox: Arc<Inbox>,
    history: Arc<History>,
}

fn setup(reply: &str) -> Setup {
    let model = Arc::new(MockModel::new(reply));
    let inbox = Arc::new(Inbox {
        events: Mutex::new(Vec::new()),
    });
    let history = Arc::new(History {
        records: history_fixture(),
        fetches: AtomicUsize::new(0),
    });

    let embedder = Arc::new(EmbeddingHandle::from_provider(model.clone(), "embed", 64));
    let retriever = Arc::new(ContextRetriever::new(
        embedder,
        history.clone(),
        Chunker::new(120, 20).unwrap(),
    ));

    let mut registry = NotifierRegistry::new();
    registry.register(inbox.clone());

    let pipeline = AnalysisPipeline::new(
        retriever,
        ReasoningClient::new(model.clone(), "meta/llama-3.1-8b-instruct", 0.5, 150),
        AlertDispatcher::new(Arc::new(registry)),
        RetrievalConfig::default(),
    );

    Setup {
        pipeline: Arc::new(pipeline),
        model,
        inbox,
        history,
    }
}

#[tokio::test]
async fn fall_event_end_to_end() {
    let s = setup(
        r#"Sure! {"summary": "A fall was detected in the bathroom.", "recommendation": "You should check on her immediately.", "reasoning": "The fall detector fired."}"#,
    );

    let request: AnalysisRequest = serde_json::from_value(serde_json::json!({
        "sensor_data": [
            {"sensor_type": "fall_detector", "value": true, "notes": "impact in bathroom"}
        ]
    }))
    .unwrap();

    let outcome = s.pipeline.run(request).await.unwrap();

    assert_eq!(outcome.mode, PromptMode::DailySummary);
    assert_eq!(outcome.parse_step, ParseStep::Bounded);
    assert_eq!(outcome.result.summary, "A fall was detected in the bathroom.");
    assert_eq!(outcome.result.recommendation, "You should check on her immediately.");
    assert_eq!(outcome.context.len(), 2);

    let prompts = s.model.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("\"sensor_type\": \"fall_detector\""));
    assert!(prompts[0].contains("impact in bathroom"));
    assert!(prompts[0].contains(&format!("1. {}", outcome.context[0])));

    let alert = outcome.alert.clone().unwrap();
    assert_eq!(alert.subject, ALERT_SUBJECT);
    outcome.delivery.unwrap().await.unwrap();

    let delivered = s.inbox.events.lock().unwrap().clone();
    assert_eq!(delivered.len(), 1);
    assert_eq!(
        delivered[0].message,
        "🚨 NOMI Alert:\nA fall was detected in the bathroom.\n\nRecommendation: You should check on her immediately."
    );
}

#[tokio::test]
async fn calm_vitals_raise_no_alert() {
    let s = setup(r#"{"summary": "Vitals are stable.", "recommendation": "You can relax.", "reasoning": "Pulse is in range."}"#);

    let result = s
        .pipeline
        .analyze(AnalysisRequest {
            posture: "sitting".into(),
            sensor_data: vec![SensorRecord::reading("heart_rate", 74)],
            ..AnalysisRequest::default()
        })
        .await
        .unwrap();

    assert_eq!(result.summary, "Vitals are stable.");
    assert!(s.model.prompts()[0].contains("Current posture: sitting"));
    assert!(s.inbox.events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_analyses_share_one_index() {
    let s = setup(r#"{"summary": "ok", "recommendation": "", "reasoning": ""}"#);

    let mut tasks = Vec::new();
    for i in 0..5 {
        let pipeline = s.pipeline.clone();
        tasks.push(tokio::spawn(async move {
            pipeline
                .analyze(AnalysisRequest {
                    sensor_data: vec![SensorRecord::reading("spo2", 95 + i)],
                    ..AnalysisRequest::default()
                })
                .await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(s.history.fetches.load(Ordering::SeqCst), 1);
    assert_eq!(s.model.prompts().len(), 5);
}

#[tokio::test]
async fn rebuilt_index_retrieves_the_same_context() {
    let a = setup("{}");
    let b = setup("{}");

    let query = "restless sleep";
    let from_a = a.pipeline.retriever().retrieve(query, 2).await.unwrap();
    let from_b = b.pipeline.retriever().retrieve(query, 2).await.unwrap();
    assert_eq!(from_a, from_b);

    a.pipeline.refresh_index().await.unwrap();
    let after_refresh = a.pipeline.retriever().retrieve(query, 2).await.unwrap();
    assert_eq!(after_refresh, from_a);
}

#[tokio::test]
async fn every_history_value_reaches_the_index() {
    let s = setup("{}");
    let index = s.pipeline.retriever().index().await.unwrap();
    // Undo the 20-character overlap to get the normalized text back.
    let mut joined = String::new();
    for (i, chunk) in index.chunks().enumerate() {
        let skip = if i == 0 { 0 } else { 20 };
        joined.extend(chunk.chars().skip(skip));
    }

    for needle in ["morning dose with breakfast", "ate half the meal", "near fall in hallway"] {
        assert!(joined.contains(needle), "{needle} missing from index");
    }
    assert!(index.chunks().all(|c| c.chars().count() <= 120));
}
