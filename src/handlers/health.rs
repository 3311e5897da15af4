use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::resource::HealthProbe;

#[derive(Clone)]
pub struct HealthState {
    pub service: &'static str,
    pub resources: Vec<&'static str>,
    pub probes: Vec<Arc<dyn HealthProbe>>,
}

pub fn health_routes(state: HealthState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .with_state(state)
}

/// GET / - Service identification
pub async fn root(State(state): State<HealthState>) -> Json<Value> {
    let endpoints: Vec<String> = state
        .resources
        .iter()
        .map(|resource| format!("/api/{resource}"))
        .collect();

    Json(json!({
        "name": format!("fms-{}", state.service),
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": endpoints,
    }))
}

/// GET /health - 200 when every store answers, 503 otherwise
pub async fn health(State(state): State<HealthState>) -> impl IntoResponse {
    let now = chrono::Utc::now();
    let mut stores = Map::new();
    let mut healthy = true;

    for probe in &state.probes {
        let status = match probe.check().await {
            Ok(()) => "ok".to_string(),
            Err(e) => {
                tracing::warn!("Health check failed for {}: {}", probe.name(), e);
                healthy = false;
                e.to_string()
            }
        };
        stores.insert(probe.name().to_string(), Value::String(status));
    }

    let status = if healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (
        status,
        Json(json!({
            "status": if healthy { "UP" } else { "DOWN" },
            "timestamp": now,
            "stores": stores,
        })),
    )
}
