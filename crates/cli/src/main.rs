//! NOMI CLI — the main entry point.
//!
//! Commands:
//! - `serve`    — Start the HTTP API server
//! - `analyze`  — Run one analysis from a readings file
//! - `refresh`  — Rebuild the semantic index from the history source
//! - `config`   — Inspect and validate configuration
//! - `doctor`   — Diagnose setup problems

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "nomi",
    about = "NOMI — elder-care sensor analysis and alerting",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of ~/.nomi/config.toml
    #[arg(short, long, global = true, env = "NOMI_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Analyze readings and print the result as JSON
    Analyze {
        /// JSON file with a record, an array of records, or a full request.
        /// Without it, the latest history is analyzed.
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Current posture (e.g. "upright", "slumped")
        #[arg(long)]
        posture: Option<String>,

        /// Current pill-bottle status (e.g. "opened", "unopened")
        #[arg(long)]
        pill_status: Option<String>,

        /// Explicit retrieval query
        #[arg(short, long)]
        query: Option<String>,
    },

    /// Rebuild the semantic index and print its stats
    Refresh,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Diagnose configuration and credentials
    Doctor,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print a default config file
    Default,
    /// Validate the configuration
    Validate,
    /// Print the default config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Serve { port } => commands::serve::run(config_path, port).await?,
        Commands::Analyze {
            file,
            posture,
            pill_status,
            query,
        } => {
            let overrides = commands::analyze::Overrides {
                posture,
                pill_status,
                query,
            };
            commands::analyze::run(config_path, file.as_deref(), overrides).await?
        }
        Commands::Refresh => commands::refresh::run(config_path).await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show(config_path).await?,
            ConfigAction::Default => commands::config_cmd::default().await?,
            ConfigAction::Validate => commands::config_cmd::validate(config_path).await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
        },
        Commands::Doctor => commands::doctor::run(config_path).await?,
    }

    Ok(())
}
