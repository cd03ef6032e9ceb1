//! Output parser — recovers `{summary, recommendation, reasoning}` from
//! free-form model text.
//!
//! The chain never fails:
//! 1. **Strict** — the whole (trimmed) text is a JSON object.
//! 2. **Bounded** — the span from the first `{` to the last `}` is.
//! 3. **Literal** — the trimmed text becomes the summary.
//!
//! An object carrying none of the three keys is treated as unusable and
//! falls through to the literal step.

use nomi_core::analysis::AnalysisResult;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

const KEYS: [&str; 3] = ["summary", "recommendation", "reasoning"];

/// Which step of the chain produced the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseStep {
    Strict,
    Bounded,
    Literal,
}

/// Why the parser fell back to the literal step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseDegradation {
    /// No `{ ... }` span in the text.
    NoJsonObject,
    /// A span was found but is not a valid JSON object.
    Malformed(String),
    /// An object was parsed but has none of the expected keys.
    MissingKeys,
}

impl std::fmt::Display for ParseDegradation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoJsonObject => write!(f, "no JSON object in model output"),
            Self::Malformed(detail) => write!(f, "malformed JSON in model output: {detail}"),
            Self::MissingKeys => write!(f, "JSON object has none of the expected keys"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedOutput {
    pub result: AnalysisResult,
    pub step: ParseStep,
    /// Set only when `step` is [`ParseStep::Literal`].
    pub degradation: Option<ParseDegradation>,
}

/// Extract an [`AnalysisResult`] from raw model output.
pub fn parse_output(text: &str) -> ParsedOutput {
    let trimmed = text.trim();
    let mut degradation = None;

    match parse_object(trimmed) {
        Ok(Some(result)) => return parsed(result, ParseStep::Strict),
        Ok(None) => degradation = Some(ParseDegradation::MissingKeys),
        Err(_) => {}
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => match parse_object(&trimmed[start..=end]) {
            Ok(Some(result)) => return parsed(result, ParseStep::Bounded),
            Ok(None) => degradation = Some(ParseDegradation::MissingKeys),
            Err(detail) => {
                degradation.get_or_insert(ParseDegradation::Malformed(detail));
            }
        },
        _ => {
            degradation.get_or_insert(ParseDegradation::NoJsonObject);
        }
    }

    let degradation = degradation.unwrap_or(ParseDegradation::NoJsonObject);
    warn!(reason = %degradation, "Model output not structured, using raw text as summary");

    ParsedOutput {
        result: AnalysisResult {
            summary: trimmed.to_string(),
            recommendation: String::new(),
            reasoning: String::new(),
        },
        step: ParseStep::Literal,
        degradation: Some(degradation),
    }
}

fn parsed(result: AnalysisResult, step: ParseStep) -> ParsedOutput {
    debug!(?step, "Model output parsed");
    ParsedOutput {
        result,
        step,
        degradation: None,
    }
}

/// `Ok(Some)` for an object with at least one key, `Ok(None)` for an
/// object with none, `Err` when `candidate` is not a JSON object.
fn parse_object(candidate: &str) -> Result<Option<AnalysisResult>, String> {
    let value: Value = serde_json::from_str(candidate).map_err(|e| e.to_string())?;
    let Value::Object(map) = value else {
        return Err("not a JSON object".into());
    };

    if !KEYS.iter().any(|k| map.contains_key(*k)) {
        return Ok(None);
    }

    Ok(Some(AnalysisResult {
        summary: field(&map, "summary"),
        recommendation: field(&map, "recommendation"),
        reasoning: field(&map, "reasoning"),
    }))
}

fn field(map: &Map<String, Value>, key: &str) -> String {
    match map.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
