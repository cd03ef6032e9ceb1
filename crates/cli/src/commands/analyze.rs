//! `nomi analyze` — One analysis from the command line.
//!
//! The result goes to stdout as JSON; diagnostics go to stderr so the
//! output can be piped.

use std::path::Path;

use nomi_agent::AnalysisPipeline;
use nomi_core::analysis::AnalysisRequest;
use nomi_core::record::SensorRecord;
use serde_json::Value;

/// Flags that override whatever the input file says.
#[derive(Debug, Default)]
pub struct Overrides {
    pub posture: Option<String>,
    pub pill_status: Option<String>,
    pub query: Option<String>,
}

pub async fn run(
    config_path: Option<&Path>,
    file: Option<&Path>,
    overrides: Overrides,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;

    let input = match file {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
            Some(serde_json::from_str(&content)?)
        }
        None => None,
    };
    let request = build_request(input, overrides)?;

    let pipeline = AnalysisPipeline::from_config(&config)?;
    let outcome = pipeline.run(request).await?;

    eprintln!(
        "mode: {}, parse: {:?}, context passages: {}",
        outcome.mode,
        outcome.parse_step,
        outcome.context.len()
    );
    if let Some(degradation) = &outcome.degradation {
        eprintln!("model output degraded: {degradation}");
    }
    if let Some(alert) = &outcome.alert {
        eprintln!("ALERT raised (keywords: {})", alert.matched_keywords.join(", "));
    }

    println!("{}", serde_json::to_string_pretty(&outcome.result)?);

    // The process exits with main; let delivery finish first.
    if let Some(delivery) = outcome.delivery {
        delivery.await?;
    }

    Ok(())
}

/// Turn the input file into a request.
///
/// An object with a `sensor_data` key is a full request; anything else is
/// one record or an array of records. No input means "analyze the latest
/// history".
pub fn build_request(
    input: Option<Value>,
    overrides: Overrides,
) -> Result<AnalysisRequest, serde_json::Error> {
    let mut request = match input {
        Some(value @ Value::Object(_)) if value.get("sensor_data").is_some() => {
            serde_json::from_value(value)?
        }
        Some(value) => AnalysisRequest {
            sensor_data: SensorRecord::many_from_json(value)?,
            ..AnalysisRequest::default()
        },
        None => AnalysisRequest::default(),
    };

    if let Some(posture) = overrides.posture {
        request.posture = posture;
    }
    if let Some(pill_status) = overrides.pill_status {
        request.pill_status = pill_status;
    }
    if overrides.query.is_some() {
        request.query = overrides.query;
    }

    Ok(request)
}
