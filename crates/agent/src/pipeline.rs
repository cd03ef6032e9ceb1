//! The analysis pipeline — the heart of NOMI.
//!
//! One analysis runs these steps:
//!
//! 1. **Readings**: the request's records, or the history source's current
//!    records when the request carries none
//! 2. **Mode**: daily summary vs. real-time, from the sensor types
//! 3. **Retrieve**: top-k history passages for a query derived from the request
//! 4. **Prompt**: readings, context and mode instructions
//! 5. **Reason**: one model call
//! 6. **Parse**: strict → bounded → literal
//! 7. **Alert**: keyword scan of the raw output; delivery runs in the background
//!
//! All shared state (lazy embedding handle, published index) lives in the
//! pipeline value, which callers share behind an `Arc`.

use std::sync::Arc;

use nomi_channels::NotifierRegistry;
use nomi_config::{AppConfig, HistoryConfig, RetrievalConfig};
use nomi_core::analysis::{AlertEvent, AnalysisRequest, AnalysisResult};
use nomi_core::error::Error;
use nomi_core::history::HistorySource;
use nomi_core::record::SensorRecord;
use nomi_memory::{
    Chunker, ContextRetriever, EmbeddingHandle, FileHistorySource, HttpHistorySource, IndexStats,
    StaticHistorySource,
};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::alert::{AlertDispatcher, build_alert};
use crate::parser::{ParseDegradation, ParseStep, parse_output};
use crate::prompt::{PromptInput, PromptMode, build_prompt};
use crate::reasoning::ReasoningClient;

/// Everything one analysis produced, for callers that need more than the
/// [`AnalysisResult`].
#[derive(Debug)]
pub struct AnalysisOutcome {
    pub result: AnalysisResult,
    pub mode: PromptMode,
    /// The text used for retrieval.
    pub query: String,
    /// Passages injected into the prompt, best first.
    pub context: Vec<String>,
    pub parse_step: ParseStep,
    pub degradation: Option<ParseDegradation>,
    pub alert: Option<AlertEvent>,
    /// Background delivery of `alert`. Dropping it does not cancel delivery.
    pub delivery: Option<JoinHandle<()>>,
}

pub struct AnalysisPipeline {
    retriever: Arc<ContextRetriever>,
    reasoning: ReasoningClient,
    alerts: AlertDispatcher,
    retrieval: RetrievalConfig,
}

impl AnalysisPipeline {
    pub fn new(
        retriever: Arc<ContextRetriever>,
        reasoning: ReasoningClient,
        alerts: AlertDispatcher,
        retrieval: RetrievalConfig,
    ) -> Self {
        Self {
            retriever,
            reasoning,
            alerts,
            retrieval,
        }
    }

    /// Wire up the pipeline described by `config`.
    ///
    /// The reasoning key is checked here; the embedding provider is only
    /// built on the first retrieval.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let reasoning_provider = nomi_providers::build_reasoning_provider(config)?;
        let reasoning = ReasoningClient::from_config(reasoning_provider, &config.reasoning);

        let embedding_config = config.clone();
        let embedder = Arc::new(EmbeddingHandle::new(
            &config.embedding.model,
            config.embedding.batch_size,
            move || nomi_providers::build_embedding_provider(&embedding_config),
        ));

        let chunker = Chunker::new(config.chunking.chunk_size, config.chunking.chunk_overlap)?;
        let source = build_history_source(&config.history)?;
        let retriever = Arc::new(ContextRetriever::new(embedder, source, chunker));

        let notifiers = NotifierRegistry::from_config(&config.alerts)
            .map_err(|e| Error::config(format!("alert channels: {e}")))?;
        let alerts = AlertDispatcher::new(Arc::new(notifiers));

        info!(
            model = %config.reasoning.model,
            embedding_model = %config.embedding.model,
            notifiers = alerts.notifiers().len(),
            "Analysis pipeline ready"
        );

        Ok(Self::new(retriever, reasoning, alerts, config.retrieval.clone()))
    }

    pub fn retriever(&self) -> &Arc<ContextRetriever> {
        &self.retriever
    }

    pub fn reasoning(&self) -> &ReasoningClient {
        &self.reasoning
    }

    pub fn alerts(&self) -> &AlertDispatcher {
        &self.alerts
    }

    /// Analyze one bundle of readings.
    pub async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisResult, Error> {
        Ok(self.run(request).await?.result)
    }

    /// Analyze one bundle of readings and report every intermediate.
    pub async fn run(&self, request: AnalysisRequest) -> Result<AnalysisOutcome, Error> {
        let AnalysisRequest {
            posture,
            pill_status,
            sensor_data,
            query,
        } = request;

        let records = if sensor_data.is_empty() {
            info!("No readings in request, using history source");
            self.fetch_history().await?
        } else {
            sensor_data
        };

        let mode = PromptMode::select(&records);
        let query = derive_query(
            query.as_deref(),
            &records,
            self.retrieval.query_window,
            &self.retrieval.fallback_query,
        );
        let context = self.retriever.retrieve(&query, self.retrieval.top_k).await?;

        let prompt = build_prompt(
            mode,
            &PromptInput {
                records: &records,
                context: &context,
                posture: &posture,
                pill_status: &pill_status,
            },
        )?;

        let raw = self.reasoning.complete(&prompt).await?;
        let parsed = parse_output(&raw);

        let alert = build_alert(&raw, &parsed.result);
        let delivery = alert.clone().map(|event| self.alerts.spawn(event));

        info!(
            mode = %mode,
            records = records.len(),
            context = context.len(),
            parse_step = ?parsed.step,
            alert = alert.is_some(),
            "Analysis complete"
        );

        Ok(AnalysisOutcome {
            result: parsed.result,
            mode,
            query,
            context,
            parse_step: parsed.step,
            degradation: parsed.degradation,
            alert,
            delivery,
        })
    }

    /// Current records from the history source.
    pub async fn fetch_history(&self) -> Result<Vec<SensorRecord>, Error> {
        Ok(self.retriever.source().fetch().await?)
    }

    /// Force an index rebuild from the history source.
    pub async fn refresh_index(&self) -> Result<IndexStats, Error> {
        self.retriever.refresh().await
    }

    pub async fn index_stats(&self) -> IndexStats {
        self.retriever.stats().await
    }
}

/// The retrieval query for one analysis.
///
/// The explicit query if it is not blank; otherwise the sensor types and
/// notes of the last `window` records; otherwise `fallback`.
pub fn derive_query(
    explicit: Option<&str>,
    records: &[SensorRecord],
    window: usize,
    fallback: &str,
) -> String {
    if let Some(q) = explicit.map(str::trim).filter(|q| !q.is_empty()) {
        return q.to_string();
    }

    let start = records.len().saturating_sub(window);
    let derived = records[start..]
        .iter()
        .flat_map(|r| [r.sensor_type.as_deref(), r.notes.as_deref()])
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if derived.is_empty() {
        fallback.to_string()
    } else {
        derived
    }
}

/// HTTP source when a URL is set, else a file, else an empty source.
pub fn build_history_source(config: &HistoryConfig) -> Result<Arc<dyn HistorySource>, Error> {
    if let Some(url) = config.url.as_deref().filter(|u| !u.trim().is_empty()) {
        return Ok(Arc::new(HttpHistorySource::new(url, config.timeout_secs)?));
    }
    if let Some(path) = &config.file {
        return Ok(Arc::new(FileHistorySource::new(path)));
    }
    warn!("No history source configured (set DYNAMO_API_URL or history.url), history is empty");
    Ok(Arc::new(StaticHistorySource::default()))
}
