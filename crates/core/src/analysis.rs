//! Request/response types of the analysis entry point.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::record::SensorRecord;

/// One invocation of the analysis pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Current posture reported by the camera/IMU (e.g. "upright", "slumped")
    #[serde(default = "default_posture")]
    pub posture: String,

    /// Current pill-bottle state (e.g. "closed", "opened", "unopened")
    #[serde(default = "default_pill_status")]
    pub pill_status: String,

    /// Current readings, oldest first. Empty means "fetch the latest from the data source".
    #[serde(default)]
    pub sensor_data: Vec<SensorRecord>,

    /// Explicit retrieval query; derived from the readings when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

fn default_posture() -> String {
    "normal".into()
}

fn default_pill_status() -> String {
    "closed".into()
}

impl Default for AnalysisRequest {
    fn default() -> Self {
        Self {
            posture: default_posture(),
            pill_status: default_pill_status(),
            sensor_data: Vec::new(),
            query: None,
        }
    }
}

/// The structured answer returned to the caregiver.
///
/// Always fully populated; fields are empty strings when the model output
/// could not be parsed into them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub summary: String,
    pub recommendation: String,
    pub reasoning: String,
}

/// An emergency notification derived from one analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertEvent {
    /// Unique ID, for correlating deliveries in logs
    pub id: String,

    pub subject: String,

    pub message: String,

    /// Emergency keywords found in the model output
    pub matched_keywords: Vec<String>,

    pub raised_at: DateTime<Utc>,
}

impl AlertEvent {
    pub fn new(
        subject: impl Into<String>,
        message: impl Into<String>,
        matched_keywords: Vec<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            subject: subject.into(),
            message: message.into(),
            matched_keywords,
            raised_at: Utc::now(),
        }
    }
}
