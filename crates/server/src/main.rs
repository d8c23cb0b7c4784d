//! AQI Server - ensemble AQI prediction service
//!
//! Loads or trains both models before accepting connections, then serves
//! predictions, health and metrics over HTTP.

use anyhow::Result;
use aqi_lib::{
    observability::{ServiceMetrics, StructuredLogger},
    regressor::ModelKind,
    registry::SlotState,
    DatasetStore, EnsemblePredictor, ModelRegistry, RegistryStatus,
};
use aqi_server::{api, config};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting aqi-server");

    let config = config::ServerConfig::load()?;
    let metrics = ServiceMetrics::new();
    let logger = StructuredLogger::new("aqi-server");
    logger.log_startup(
        SERVER_VERSION,
        &config.dataset_path.display().to_string(),
        &config.model_dir.display().to_string(),
    );

    // Models must be settled before the listener binds
    let registry_config = config.registry_config();
    let dataset = DatasetStore::new(config.dataset_path.clone());
    let start = Instant::now();
    let registry =
        tokio::task::spawn_blocking(move || ModelRegistry::initialize(&registry_config, &dataset))
            .await?;

    match registry.status() {
        RegistryStatus::Ready => {
            let n_records = registry.trained_records().unwrap_or(0);
            if registry.slot_state(ModelKind::RandomForest) == SlotState::Loaded {
                logger.log_models_loaded(n_records);
            } else {
                logger.log_models_trained(n_records, start.elapsed().as_secs_f64());
            }
        }
        RegistryStatus::Unavailable { reason } => logger.log_models_unavailable(reason),
    }

    let predictor = Arc::new(EnsemblePredictor::new(Arc::new(registry)));
    let app_state = Arc::new(api::AppState::new(predictor, metrics, logger.clone()));

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    api::serve(&config.host, config.port, app_state, shutdown).await?;

    logger.log_shutdown("SIGINT received");
    info!("Shutting down");

    Ok(())
}
