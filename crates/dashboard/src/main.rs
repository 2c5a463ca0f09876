//! Rainfall Dashboard - serves rainfall (RR) predictions over HTTP
//!
//! Loads the selected pre-trained model for every request, categorizes
//! the result and exposes health and metrics endpoints.

use anyhow::Result;
use rainfall_dashboard::{api, DashboardConfig};
use rainfall_lib::{
    health::HealthRegistry,
    observability::{PredictionMetrics, StructuredLogger},
    predictor::ArtifactRegistry,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DASHBOARD_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting rainfall-dashboard");

    let config = DashboardConfig::load()?;
    info!(
        instance = %config.instance_name,
        model_dir = %config.model_dir.display(),
        "Dashboard configured"
    );

    let registry = ArtifactRegistry::new(config.registry_config());

    let health_registry = HealthRegistry::new();
    let available = health_registry.refresh_artifacts(&registry).await;
    if available == 0 {
        warn!(
            model_dir = %config.model_dir.display(),
            "No model artifacts found; prediction requests will fail until they are added"
        );
    }

    let metrics = PredictionMetrics::new();

    let logger = StructuredLogger::new(&config.instance_name);
    logger.log_startup(
        DASHBOARD_VERSION,
        &config.model_dir.display().to_string(),
        available,
    );

    let app_state = Arc::new(api::AppState::new(
        registry,
        health_registry.clone(),
        metrics,
        logger.clone(),
        config.max_upload_bytes,
    ));

    health_registry.set_ready(true).await;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for shutdown signal");
        }
    };
    api::serve(&config.bind_addr(), app_state, shutdown).await?;

    logger.log_shutdown("SIGINT received");
    info!("Shutting down");

    Ok(())
}
