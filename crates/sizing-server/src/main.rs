//! Right-sizing server
//!
//! Loads one set of collector sheets at startup and serves read-only
//! recommendation queries over it.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use sizing_lib::{Dataset, EngineError, EngineMetrics, StructuredLogger};
use sizing_server::{api, config::ServerConfig};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // JSON output, RUST_LOG filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting rightsize-server");

    let config = ServerConfig::load()?;
    info!(
        instance = %config.instance,
        input_dir = %config.input_dir.display(),
        validation = %config.validation,
        "Server configured"
    );

    let metrics = EngineMetrics::new();
    let logger = StructuredLogger::new(&config.instance);

    let source = config.input_dir.display().to_string();
    let dataset = load_dataset(&config, &source, &metrics, &logger)?;

    let state = Arc::new(api::AppState::new(dataset, source, metrics, logger.clone()));

    logger.log_startup(SERVER_VERSION, &format!("0.0.0.0:{}", config.api_port));
    api::serve(config.api_port, state, shutdown_signal()).await?;

    logger.log_shutdown("SIGINT received");
    info!("Shutting down");

    Ok(())
}

/// Build the dataset, failing fast on schema or value errors
fn load_dataset(
    config: &ServerConfig,
    source: &str,
    metrics: &EngineMetrics,
    logger: &StructuredLogger,
) -> Result<Dataset> {
    let started = Instant::now();
    let dataset = match Dataset::load(&config.sheet_paths(), &config.dataset_options()) {
        Ok(dataset) => dataset,
        Err(e) => {
            metrics.inc_ingest_failures();
            match &e {
                EngineError::DataQuality(findings) => {
                    metrics.record_findings(findings);
                    logger.log_data_quality_rejected(source, findings);
                }
                _ => logger.log_schema_error(source, &e),
            }
            return Err(e).context(format!("Failed to load dataset from {}", source));
        }
    };
    let elapsed = started.elapsed().as_secs_f64();

    for finding in dataset.findings() {
        logger.log_data_quality_issue(finding);
    }
    metrics.record_findings(dataset.findings());
    metrics.set_vms_loaded(dataset.len());
    metrics.observe_ingest_latency(elapsed);
    logger.log_dataset_loaded(source, dataset.len(), dataset.findings().len(), elapsed);

    Ok(dataset)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
