use axum::{extract::State, routing::post, Json, Router};

use crate::domain::{Entity, Passenger, PassengerRegistration};
use crate::handlers::resource::ResourceState;
use crate::middleware::{ApiResponse, ApiResult, Identity};

pub fn registration_routes(state: ResourceState<Passenger>) -> Router {
    Router::new()
        .route("/api/registerpassenger", post(register))
        .with_state(state)
}

/// POST /api/registerpassenger - Called by the gateway when a user signs up
pub async fn register(
    State(state): State<ResourceState<Passenger>>,
    _identity: Identity,
    Json(registration): Json<PassengerRegistration>,
) -> ApiResult<()> {
    tracing::debug!("REST request to register passenger : {}", registration.login);

    let persisted = state
        .resource
        .create(Passenger::from(registration))
        .await
        .map_err(|e| crate::error::ApiError::from(e).with_alerts(&state.alerts))?;
    let id = persisted.record.id().unwrap_or_default();

    Ok(ApiResponse::no_content().with_headers(state.alerts.updated(Passenger::ENTITY_NAME, id)))
}
