//! Pediatric Risk Engine - HTTP server

use pediarisk::{api, EngineConfig, LogisticRiskModel, RiskEngine};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Pediatric Risk Engine v{}", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::var("CONFIG_PATH")
        .unwrap_or_else(|_| "/etc/pediarisk/engine.json".into());

    let config = EngineConfig::load(&config_path)
        .unwrap_or_else(|e| {
            tracing::warn!("{e}, using defaults");
            EngineConfig::default()
        })
        .with_env();

    // The classifier is loaded once and shared read-only by every request
    let model = LogisticRiskModel::load(&config.model_path)?;
    let engine = Arc::new(RiskEngine::new(Arc::new(model)));

    api::start_server(&config, engine).await?;

    Ok(())
}
