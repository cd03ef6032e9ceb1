//! `nomi refresh` — Rebuild the semantic index.

use std::path::Path;

use nomi_agent::AnalysisPipeline;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let pipeline = AnalysisPipeline::from_config(&config)?;

    let stats = pipeline.refresh_index().await?;
    println!("{}", serde_json::to_string_pretty(&stats)?);

    Ok(())
}
