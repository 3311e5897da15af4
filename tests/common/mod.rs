#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use fms_services::auth::{generate_jwt, Claims};
use fms_services::config::AppConfig;
use fms_services::events::{EventEmitter, MemoryEventBus};
use fms_services::services::{build_router, Backends, SearchBackend, ServiceKind, StoreBackend};
use reqwest::StatusCode;

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub events: Arc<MemoryEventBus>,
    config: AppConfig,
}

impl TestServer {
    /// One in-process service on a free port, backed by memory only
    pub async fn spawn(kind: ServiceKind) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut config = AppConfig::development();
        config.server.port = port;

        let events = Arc::new(MemoryEventBus::new());
        let backends = Backends {
            store: StoreBackend::Memory,
            events: EventEmitter::new(events.clone()),
            search: SearchBackend::Memory,
        };
        let app = build_router(kind, &backends, &config)?;

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test port")?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let server = Self {
            port,
            base_url,
            events,
            config,
        };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Bearer token for `login`, signed with the server's secret
    pub fn token(&self, login: &str) -> String {
        let claims = Claims::new(login, &["ROLE_USER".to_string()], 1);
        generate_jwt(&self.config.security.jwt_secret, &claims).expect("token")
    }

    pub fn alert_header(&self, suffix: &str) -> String {
        format!("x-{}-{}", self.config.server.application_name.to_lowercase(), suffix)
    }
}
