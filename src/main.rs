//! ML Inference Service - Main Entry Point
//!
//! Loads the classifier, then serves predictions, health, readiness and
//! metrics over HTTP. A failed load keeps the process up with readiness down.

use anyhow::{Context, Result};
use inference_service::{
    config::{AppConfig, LoggingConfig},
    metrics::MetricsRegistry,
    models::ModelHolder,
    server::{self, AppState},
};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;

    // Initialize logging
    init_logging(&config.logging)?;
    info!("Starting ML Inference Service");
    info!(
        model_path = %config.model.path,
        model_version = %config.model.version,
        "Configuration loaded successfully"
    );

    // Initialize metrics
    let metrics = Arc::new(MetricsRegistry::new()?);

    // Load the model before accepting traffic
    let mut model = ModelHolder::new(config.model.version.clone())
        .with_onnx_threads(config.model.onnx_threads);
    if let Err(e) = model.load(&config.model.path) {
        error!(error = %e, "Model failed to load");
        warn!("Serving with readiness down; /predict and /ready will return 503");
    }
    metrics.set_model_version(model.version(), model.is_loaded());

    let state = AppState::new(model, metrics);
    let app = server::router(state);

    let listener = server::bind(&config.server).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down...");
    Ok(())
}

fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("inference_service={}", config.level).parse()?);
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if config.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
