//! Batch Predictor
//!
//! Runs a restaurant CSV through the prediction pipeline without the web server.

use anyhow::{Context, Result};
use restaurant_predictor::{
    config::{AppConfig, DEFAULT_CONFIG_PATH},
    types::report::DOWNLOAD_FILE_NAME,
    PipelineError, PredictionEngine, Table,
};
use std::fs::File;
use std::time::Instant;
use tracing::{error, info};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("predict_csv=info".parse()?)
                .add_directive("restaurant_predictor=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let Some(input) = args.get(1) else {
        anyhow::bail!("usage: predict_csv <input.csv> [output.csv] [config]");
    };
    let output = args.get(2).map(|s| s.as_str()).unwrap_or(DOWNLOAD_FILE_NAME);
    let config_path = args.get(3).map(|s| s.as_str()).unwrap_or(DEFAULT_CONFIG_PATH);

    let config = AppConfig::load_from_path(config_path)?;
    let engine = PredictionEngine::new(&config).context("Failed to load model artifacts")?;

    let file = File::open(input).with_context(|| format!("Failed to open {}", input))?;
    let table = Table::from_csv_reader(file)?;
    info!(input = %input, rows = table.len(), "Loaded upload");

    let start_time = Instant::now();
    let predicted = match engine.process(table) {
        Ok(predicted) => predicted,
        Err(PipelineError::MissingColumns { columns }) => {
            error!(missing = ?columns, "Missing required columns");
            anyhow::bail!("Missing required columns: {:?}", columns);
        }
        Err(e) => return Err(e.into()),
    };

    std::fs::write(output, predicted.table.to_csv_bytes()?)
        .with_context(|| format!("Failed to write {}", output))?;

    let online = predicted.online_order.iter().filter(|&&l| l == 1).count();
    info!(
        output = %output,
        rows = predicted.online_order.len(),
        predicted_online = online,
        processing_time_ms = start_time.elapsed().as_millis(),
        "Predictions written"
    );

    Ok(())
}
