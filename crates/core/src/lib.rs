//! # NOMI Core
//!
//! Domain types, traits, and error definitions for the NOMI elder-care
//! analysis pipeline. This crate has **no framework dependencies** — it
//! defines the domain model that every other crate implements against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (language model, historical data source,
//! notification channel) is a trait here. Implementations live in their
//! respective crates, so the pipeline can be tested with scripted stand-ins.

pub mod analysis;
pub mod error;
pub mod history;
pub mod message;
pub mod notifier;
pub mod provider;
pub mod record;

// Re-export key types at crate root for ergonomics
pub use analysis::{AlertEvent, AnalysisRequest, AnalysisResult};
pub use error::{Error, Result};
pub use history::HistorySource;
pub use message::{Message, Role};
pub use notifier::Notifier;
pub use provider::{Provider, ProviderRequest, ProviderResponse};
pub use record::SensorRecord;
