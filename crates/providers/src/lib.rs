//! Language-model provider implementations for NOMI.
//!
//! All providers implement the `nomi_core::Provider` trait.
//! The factory builds them from configuration.

pub mod factory;
pub mod openai_compat;

pub use factory::{build_embedding_provider, build_reasoning_provider};
pub use openai_compat::OpenAiCompatProvider;
