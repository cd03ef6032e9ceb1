//! The NOMI analysis pipeline.
//!
//! Readings come in, relevant history is retrieved from the semantic index,
//! a prompt is assembled and sent to the reasoning model, the reply is
//! parsed into a structured result, and an alert is raised when the reply
//! indicates an emergency.

pub mod alert;
pub mod parser;
pub mod pipeline;
pub mod prompt;
pub mod reasoning;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use alert::{ALERT_SUBJECT, AlertDispatcher, EMERGENCY_KEYWORDS, build_alert};
pub use parser::{ParseDegradation, ParseStep, ParsedOutput, parse_output};
pub use pipeline::{AnalysisOutcome, AnalysisPipeline, build_history_source, derive_query};
pub use prompt::{PromptInput, PromptMode, build_prompt};
pub use reasoning::ReasoningClient;
