//! Herd Monitor - livestock health prediction service
//!
//! Loads the trained classifier artifacts at startup and serves a single
//! prediction endpoint combining model inference with rule-based alerts.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use monitor_lib::{
    health::{components, HealthRegistry},
    observability::{MonitorMetrics, StructuredLogger},
    pipeline::HealthPipeline,
    store::HttpVerdictStore,
    ModelArtifacts,
};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;

const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting herd-monitor");

    // Load configuration
    let config = config::MonitorConfig::load()?;
    info!(artifacts_dir = %config.artifacts_dir, "Service configured");

    // Load model artifacts; any missing or corrupt artifact aborts startup
    let artifacts = ModelArtifacts::load(Path::new(&config.artifacts_dir))
        .context("Failed to load model artifacts")?;
    let pipeline = Arc::new(HealthPipeline::from_artifacts(artifacts));

    // Initialize metrics
    let metrics = MonitorMetrics::new();
    metrics.set_model_version(pipeline.model_version());

    // Initialize structured logger
    let logger = StructuredLogger::new("herd-monitor");
    logger.log_startup(SERVICE_VERSION, pipeline.model_version());

    // Initialize health registry
    let health_registry = HealthRegistry::new();
    health_registry.register(components::CLASSIFIER).await;

    // Optional verdict store
    let store = match &config.store_base_url {
        Some(base_url) => {
            health_registry.register(components::VERDICT_STORE).await;
            Some(Arc::new(HttpVerdictStore::new(base_url.clone()))
                as Arc<dyn monitor_lib::VerdictStore>)
        }
        None => {
            info!("No verdict store configured, persistence disabled");
            None
        }
    };

    // Create shared application state
    let app_state = Arc::new(api::AppState::new(
        pipeline,
        health_registry.clone(),
        metrics.clone(),
        logger.clone(),
        store,
        config.app_namespace.clone(),
    ));

    // Mark service as ready after artifacts are loaded
    health_registry.set_ready(true).await;

    // Start API server
    let api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    logger.log_shutdown("SIGINT received");
    info!("Shutting down");
    api_handle.abort();

    Ok(())
}
