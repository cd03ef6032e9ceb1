//! `nomi doctor` — Diagnose setup problems.

use std::path::Path;

use nomi_agent::AnalysisPipeline;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("NOMI Doctor — System Diagnostics");
    println!("================================\n");

    let mut issues = 0;

    let file = super::config_file(config_path);
    if file.exists() {
        println!("  ✅ Config file found at {}", file.display());
    } else {
        println!("  ⚠️  No config file at {}, using defaults", file.display());
    }

    let config = match super::load_config(config_path) {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ {e}");
            println!("\n  ⚠️  1 issue(s) found. See above for details.");
            return Ok(());
        }
    };

    for warning in super::config_cmd::warnings(&config) {
        println!("  ⚠️  {warning}");
        issues += 1;
    }

    if let Some(file) = &config.history.file {
        if config.history.url.is_none() && !file.exists() {
            println!("  ❌ History file {} does not exist", file.display());
            issues += 1;
        }
    }

    match AnalysisPipeline::from_config(&config) {
        Ok(pipeline) => {
            println!("  ✅ Pipeline wiring OK");
            for (name, healthy) in pipeline.alerts().notifiers().health_check_all().await {
                if healthy {
                    println!("  ✅ Alert channel {name} ready");
                } else {
                    println!("  ❌ Alert channel {name} unhealthy");
                    issues += 1;
                }
            }
        }
        Err(e) => {
            println!("  ❌ Pipeline cannot start: {e}");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
