// src/main.rs

use std::path::PathBuf;

use anyhow::Result;
use maitre::app::MaitreApp;
use maitre_config::{ConfigLoader, ConfigValidator, MaitreConfig};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config()?;

    init_logging(&config.app.log_level)?;

    info!(
        "Starting Maitre booking assistant v{}",
        env!("CARGO_PKG_VERSION")
    );

    ConfigValidator::validate(&config)?;

    let app = MaitreApp::new(config).await?;
    app.run().await?;

    info!("Maitre shut down successfully");
    Ok(())
}

fn init_logging(default_level: &str) -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("maitre={},info", default_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    Ok(())
}

fn load_config() -> Result<MaitreConfig> {
    let path = std::env::var("MAITRE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config/maitre.toml"));

    Ok(ConfigLoader::load(Some(&path))?)
}
