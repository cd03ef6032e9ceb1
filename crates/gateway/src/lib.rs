//! HTTP API gateway for NOMI.
//!
//! A thin layer over the analysis pipeline: every handler forwards into
//! [`AnalysisPipeline`] and maps failures to a JSON error body.
//!
//! Built on Axum for async HTTP.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use nomi_agent::AnalysisPipeline;
use nomi_core::analysis::{AnalysisRequest, AnalysisResult};
use nomi_core::record::SensorRecord;
use nomi_memory::IndexStats;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Sampling for the plain chat passthrough.
const CHAT_TEMPERATURE: f32 = 0.7;
const CHAT_MAX_TOKENS: u32 = 100;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub pipeline: Arc<AnalysisPipeline>,
    pub started_at: DateTime<Utc>,
}

impl GatewayState {
    pub fn new(pipeline: Arc<AnalysisPipeline>) -> Self {
        Self {
            pipeline,
            started_at: Utc::now(),
        }
    }
}

pub type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
///
/// Layers applied:
/// - CORS open to any origin (the dashboard is served separately)
/// - Request body size limit (1 MB)
/// - HTTP trace logging
pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/analyze", post(analyze_handler))
        .route("/index/refresh", post(refresh_handler))
        .route("/data", get(data_handler))
        .route("/generate", post(generate_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
pub async fn start(
    config: nomi_config::AppConfig,
    port_override: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    let host = config.gateway.host.clone();
    let port = port_override.unwrap_or(config.gateway.port);
    let addr = format!("{host}:{port}");

    let pipeline = Arc::new(AnalysisPipeline::from_config(&config)?);
    let app = build_router(Arc::new(GatewayState::new(pipeline)));

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn internal_error(prefix: &str, err: impl std::fmt::Display) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: format!("{prefix}: {err}"),
        }),
    )
}

#[derive(Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
}

async fn root_handler() -> Json<RootResponse> {
    Json(RootResponse {
        message: "NOMI backend is live!".into(),
    })
}

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: i64,
    pub index: IndexStats,
    pub notifiers: Vec<String>,
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        uptime_secs: (Utc::now() - state.started_at).num_seconds(),
        index: state.pipeline.index_stats().await,
        notifiers: state.pipeline.alerts().notifiers().list(),
    })
}

async fn analyze_handler(
    State(state): State<SharedState>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<AnalysisResult>, ApiError> {
    info!(records = request.sensor_data.len(), "Analyze request");

    state.pipeline.analyze(request).await.map(Json).map_err(|e| {
        error!(error = %e, "Analysis failed");
        internal_error("Failed to analyze data", e)
    })
}

async fn refresh_handler(State(state): State<SharedState>) -> Result<Json<IndexStats>, ApiError> {
    state.pipeline.refresh_index().await.map(Json).map_err(|e| {
        error!(error = %e, "Index refresh failed");
        internal_error("Failed to refresh index", e)
    })
}

#[derive(Serialize, Deserialize)]
pub struct DataResponse {
    pub data: Vec<SensorRecord>,
}

async fn data_handler(State(state): State<SharedState>) -> Result<Json<DataResponse>, ApiError> {
    state
        .pipeline
        .fetch_history()
        .await
        .map(|data| Json(DataResponse { data }))
        .map_err(|e| {
            error!(error = %e, "History fetch failed");
            internal_error("Failed to fetch history data", e)
        })
}

#[derive(Serialize, Deserialize)]
pub struct GenerateRequest {
    pub message: String,
}

#[derive(Serialize, Deserialize)]
pub struct GenerateResponse {
    pub reply: String,
}

async fn generate_handler(
    State(state): State<SharedState>,
    Json(payload): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    info!(message_len = payload.message.len(), "Generate request");

    state
        .pipeline
        .reasoning()
        .chat(&payload.message, CHAT_TEMPERATURE, CHAT_MAX_TOKENS)
        .await
        .map(|reply| Json(GenerateResponse { reply }))
        .map_err(|e| {
            error!(error = %e, "Chat passthrough failed");
            internal_error("Failed to generate reply", e)
        })
}
