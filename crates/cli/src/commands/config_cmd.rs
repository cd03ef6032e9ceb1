//! `nomi config` — Configuration management commands.

use std::path::Path;

use nomi_config::AppConfig;

const REDACTED: &str = "***";

pub async fn validate(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("Validating configuration...");

    let config = match super::load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            println!("   ❌ {e}");
            return Err(e);
        }
    };
    println!("   ✅ Config parsed successfully");

    let warnings = warnings(&config);
    if warnings.is_empty() {
        println!("   ✅ All checks passed");
    } else {
        println!();
        for w in &warnings {
            println!("   ⚠️  {w}");
        }
    }

    println!();
    println!("   Model:      {}", config.reasoning.model);
    println!("   Embedding:  {}", config.embedding.model);
    println!("   Chunking:   {} / {}", config.chunking.chunk_size, config.chunking.chunk_overlap);
    println!("   Top-k:      {}", config.retrieval.top_k);
    println!("   Gateway:    {}:{}", config.gateway.host, config.gateway.port);
    println!("   Webhooks:   {}", config.alerts.webhooks.len());

    Ok(())
}

/// Settings that load fine but will fail or misbehave at runtime.
pub fn warnings(config: &AppConfig) -> Vec<&'static str> {
    let mut warnings = Vec::new();

    if config.reasoning.api_key.is_none() {
        warnings.push("No reasoning API key set (set NGC_API_KEY)");
    }
    if config.embedding_api_key().is_none() {
        warnings.push("No embedding API key set (set NOMI_EMBEDDING_API_KEY or NGC_API_KEY)");
    }
    if config.history.url.is_none() && config.history.file.is_none() {
        warnings.push("No history source configured; retrieval context will be empty");
    }
    if !config.alerts.enabled {
        warnings.push("Alerts are disabled");
    } else if !config.alerts.log && config.alerts.webhooks.is_empty() {
        warnings.push("Alerts enabled but no alert channel configured");
    }

    warnings
}

pub async fn show(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let toml_str = toml::to_string_pretty(&redacted(config))?;
    println!("{toml_str}");
    Ok(())
}

pub async fn default() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", AppConfig::default_toml());
    Ok(())
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", super::config_file(None).display());
    Ok(())
}

/// Replace every credential with a placeholder.
fn redacted(mut config: AppConfig) -> AppConfig {
    let mask = |v: &mut Option<String>| {
        if v.is_some() {
            *v = Some(REDACTED.into());
        }
    };
    mask(&mut config.reasoning.api_key);
    mask(&mut config.embedding.api_key);
    for hook in &mut config.alerts.webhooks {
        mask(&mut hook.secret);
    }
    config
}
