//! `nomi serve` — Start the HTTP API server.

use std::path::Path;

pub async fn run(
    config_path: Option<&Path>,
    port_override: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let port = port_override.unwrap_or(config.gateway.port);

    println!("NOMI Gateway");
    println!("   Listening: {}:{}", config.gateway.host, port);
    println!("   Model:     {}", config.reasoning.model);

    nomi_gateway::start(config, port_override).await?;

    Ok(())
}
