//! Placement readiness server
//!
//! Loads the persisted model, serves predictions over HTTP, and accepts CSV
//! uploads that retrain and replace the active model.

use anyhow::{Context, Result};
use readiness_lib::ReadinessService;
use readiness_server::{api, config::ServerConfig};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting readiness-server");

    let config = ServerConfig::load()?;

    // No artifact, no service
    let service =
        ReadinessService::open_with_estimator(config.service_config(), Arc::new(config.estimator()))
            .await
            .with_context(|| {
                format!(
                    "failed to load initial model from {}",
                    config.model_path.display()
                )
            })?;

    info!(
        instance = %config.instance_name,
        response_mode = ?service.response_mode(),
        learning_rate = config.learning_rate,
        max_iter = config.max_iter,
        l2_alpha = config.l2_alpha,
        "Server configured"
    );

    let model_version = service.active_model().version().to_string();
    service.logger().log_startup(
        SERVICE_VERSION,
        &model_version,
        &config.model_path.display().to_string(),
    );

    let state = Arc::new(api::AppState::new(service, config.max_upload_bytes));
    api::serve(config.port, state.clone(), shutdown_signal(state)).await?;

    info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal(state: Arc<api::AppState>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    state.service.logger().log_shutdown("SIGINT received");
}
