//! Restaurant Predictor - Main Entry Point
//!
//! Loads the fitted artifacts once and serves the upload page and prediction API.

use anyhow::{Context, Result};
use restaurant_predictor::{
    config::{AppConfig, LoggingConfig, DEFAULT_CONFIG_PATH},
    metrics::{MetricsReporter, PipelineMetrics},
    server::{build_router, AppState},
    PredictionEngine,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .context("Invalid log level")?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    // First argument overrides the config location
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = AppConfig::load_from_path(&config_path)?;

    init_tracing(&config.logging)?;
    info!(config = %config_path, "Starting Restaurant Predictor");

    let metrics = Arc::new(PipelineMetrics::new());

    let engine = Arc::new(
        PredictionEngine::new(&config).context("Failed to load model artifacts")?,
    );

    if config.metrics.report_interval_secs > 0 {
        let reporter = MetricsReporter::new(metrics.clone(), config.metrics.report_interval_secs);
        tokio::spawn(reporter.start());
    }

    let state = AppState::new(
        engine,
        metrics.clone(),
        config.pipeline.max_concurrent_uploads,
        config.pipeline.preview_rows,
    );
    let app = build_router(state, config.server.max_upload_bytes);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(
        address = %addr,
        max_concurrent_uploads = config.pipeline.max_concurrent_uploads,
        "Listening for uploads"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Predictor shutting down...");
    metrics.print_summary();

    Ok(())
}
