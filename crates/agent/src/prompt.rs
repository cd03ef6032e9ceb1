//! Prompt builder — turns readings and retrieved history into one user
//! message for the reasoning model.
//!
//! Two modes:
//! - **Daily summary** when the bundle contains activity-log sensors
//!   (eating, sleep, fall detector, medication).
//! - **Real-time** otherwise, which also reports posture and pill-bottle
//!   status.

use nomi_core::record::SensorRecord;
use serde::Serialize;

/// Sensor types that switch the prompt into daily-summary mode.
pub const DAILY_SUMMARY_SENSORS: [&str; 4] = ["eating", "sleep", "fall_detector", "meds"];

/// Marker rendered when no history passage was retrieved.
pub const NO_CONTEXT: &str = "None";

const RESPONSE_FORMAT: &str = r#"Return only one flat JSON object with exactly these three keys:
{
  "summary": "",
  "recommendation": "",
  "reasoning": ""
}"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptMode {
    DailySummary,
    RealTime,
}

impl PromptMode {
    /// Daily summary when any record's `sensor_type` is an activity-log sensor.
    pub fn select(records: &[SensorRecord]) -> Self {
        let daily = records.iter().any(|r| {
            r.sensor_type
                .as_deref()
                .is_some_and(|t| DAILY_SUMMARY_SENSORS.contains(&t))
        });
        if daily { Self::DailySummary } else { Self::RealTime }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DailySummary => "daily_summary",
            Self::RealTime => "real_time",
        }
    }
}

impl std::fmt::Display for PromptMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a prompt is rendered from.
#[derive(Debug, Clone, Copy)]
pub struct PromptInput<'a> {
    pub records: &'a [SensorRecord],
    pub context: &'a [String],
    pub posture: &'a str,
    pub pill_status: &'a str,
}

/// Render the prompt for `mode`.
///
/// Fails only if the readings cannot be serialized.
pub fn build_prompt(mode: PromptMode, input: &PromptInput<'_>) -> Result<String, serde_json::Error> {
    let readings = serde_json::to_string_pretty(input.records)?;
    let context = render_context(input.context);

    let prompt = match mode {
        PromptMode::DailySummary => format!(
            "You are NOMI, an AI elder-care assistant summarizing daily activity logs.

These are the recorded events:
{readings}

Relevant history:
{context}

Generate:
1. A short wellbeing summary for the day.
2. A direct, friendly recommendation for the caregiver, addressed as \"you\".
3. A one-sentence reasoning behind your conclusion.

{RESPONSE_FORMAT}
"
        ),
        PromptMode::RealTime => format!(
            "You are NOMI, an AI elder-care assistant.

Given these sensor readings:
{readings}

Current posture: {posture}
Pill-bottle status: {pill_status}

Relevant history:
{context}

Generate:
1. A one-sentence wellbeing summary of the elderly person's current condition, using the records available to you.
2. A one-sentence recommendation addressed directly to the caregiver (e.g. \"You should...\" or \"You can...\").
3. A one-sentence reasoning behind your conclusion. Be concise and warm.

{RESPONSE_FORMAT}
",
            posture = input.posture,
            pill_status = input.pill_status,
        ),
    };

    Ok(prompt)
}

/// Numbered list of passages, or [`NO_CONTEXT`].
fn render_context(passages: &[String]) -> String {
    if passages.is_empty() {
        return NO_CONTEXT.to_string();
    }
    passages
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{}. {p}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}
