use clap::Parser;
use tracing_subscriber::EnvFilter;

use fms_services::cli::{self, Cli};
use fms_services::config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    tracing::debug!("Configuration loaded in {:?} mode", config.environment);

    cli::run(cli, config).await
}
