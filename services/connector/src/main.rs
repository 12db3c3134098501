//! Connector binary entry point.

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use connector_service::config::{Cli, ConnectorConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => ConnectorConfig::from_file(path)?,
        None => {
            info!("no config file given, using built-in defaults");
            ConnectorConfig::default()
        }
    };
    config.apply_cli(&cli);

    connector_service::run(config).await
}
