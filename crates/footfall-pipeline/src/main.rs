//! Main entry point for Footfall.

use anyhow::{Context, Result};
use footfall_common::{init_logging, ApiKey};
use footfall_config::ConfigLoader;
use footfall_pipeline::{parse_selection, Pipeline, RunSummary};
use std::env;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ConfigLoader::load().context("Failed to load configuration")?;

    // Keep the guard alive so buffered file output is flushed on exit
    let _log_guard = init_logging(&config.logging).context("Failed to initialize logging")?;

    info!("Starting Footfall v{}", env!("CARGO_PKG_VERSION"));

    let api_key = config
        .provider
        .api_key
        .clone()
        .map(ApiKey::new)
        .filter(|key| !key.is_blank())
        .context("No API key configured; set FOOTFALL_API_KEY")?;

    let pipeline = Pipeline::from_config(config).context("Failed to create provider client")?;

    let output = match pipeline.run_pipeline(&api_key).await {
        Ok(output) => output,
        Err(e) => {
            error!("Pipeline run failed: {}", e);
            return Err(e).context("Pipeline run failed");
        }
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&RunSummary::from(output.as_ref()))?
    );

    if let Ok(raw) = env::var("FOOTFALL_SELECT") {
        let selection = parse_selection(&raw);
        info!("Analyzing {} selected places", selection.len());
        let report = pipeline.analyze_selection(&output, &selection);
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}
