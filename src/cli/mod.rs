use anyhow::Context;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;

use crate::auth::{generate_jwt, Claims};
use crate::config::AppConfig;
use crate::database::DatabaseManager;
use crate::services::{build_router, Backends, ServiceKind};

#[derive(Parser)]
#[command(name = "fms-services")]
#[command(about = "Flight management microservices")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run one service")]
    Serve {
        #[arg(value_enum, help = "Service to run")]
        service: ServiceKind,

        #[arg(long, help = "Listen port (overrides configuration)")]
        port: Option<u16>,

        #[arg(long, help = "Keep records in memory instead of PostgreSQL")]
        in_memory: bool,
    },

    #[command(about = "Mint a development bearer token")]
    Token {
        #[arg(help = "Login placed in the `sub` claim")]
        login: String,

        #[arg(long = "authority", default_value = "ROLE_USER", help = "Granted authority, repeatable")]
        authorities: Vec<String>,
    },
}

pub async fn run(cli: Cli, config: &AppConfig) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve {
            service,
            port,
            in_memory,
        } => {
            let mut config = config.clone();
            if let Some(port) = port {
                config.server.port = port;
            }
            config.database.in_memory |= in_memory;
            serve(service, &config).await
        }
        Commands::Token { login, authorities } => {
            let claims = Claims::new(login, &authorities, config.security.jwt_expiry_hours);
            let token = generate_jwt(&config.security.jwt_secret, &claims)?;
            println!("{token}");
            Ok(())
        }
    }
}

async fn serve(kind: ServiceKind, config: &AppConfig) -> anyhow::Result<()> {
    let backends = Backends::from_config(kind, config)
        .await
        .with_context(|| format!("failed to initialize {} backends", kind.name()))?;
    let app = build_router(kind, &backends, config)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("fms-{} listening on http://{}", kind.name(), addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    DatabaseManager::close_all().await;
    tracing::info!("fms-{} stopped", kind.name());
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
