use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::domain::Entity;
use crate::error::ApiError;
use crate::middleware::{Alerts, ApiResponse, ApiResult, Identity};
use crate::resource::{ResourceError, ResourceService};

/// Shared state of one resource's routes
pub struct ResourceState<E: Entity> {
    pub resource: Arc<ResourceService<E>>,
    pub alerts: Alerts,
}

impl<E: Entity> Clone for ResourceState<E> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
            alerts: self.alerts.clone(),
        }
    }
}

impl<E: Entity> ResourceState<E> {
    pub fn new(resource: Arc<ResourceService<E>>, alerts: Alerts) -> Self {
        Self { resource, alerts }
    }

    fn reject(&self, err: ResourceError) -> ApiError {
        ApiError::from(err).with_alerts(&self.alerts)
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Named list filter, e.g. `payment-is-null`
    pub filter: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: String,
}

/// `/api/{resource}`, `/api/{resource}/:id` and, for searchable resources,
/// `/api/_search/{resource}`
pub fn resource_routes<E: Entity>(state: ResourceState<E>) -> Router {
    let collection = format!("/api/{}", E::RESOURCE);
    let item = format!("/api/{}/:id", E::RESOURCE);

    let mut router = Router::new()
        .route(&collection, get(list::<E>).post(create::<E>).put(update::<E>))
        .route(&item, get(show::<E>).delete(remove::<E>));

    if state.resource.is_searchable() {
        router = router.route(&format!("/api/_search/{}", E::RESOURCE), get(search::<E>));
    }

    router.with_state(state)
}

/// POST /api/{resource} - Create a record; the id is assigned by the store
pub async fn create<E: Entity>(
    State(state): State<ResourceState<E>>,
    _identity: Identity,
    Json(record): Json<E>,
) -> ApiResult<E> {
    let persisted = state.resource.create(record).await.map_err(|e| state.reject(e))?;
    let id = persisted.record.id().unwrap_or_default();

    Ok(ApiResponse::created(persisted.record, &format!("/api/{}/{}", E::RESOURCE, id))
        .with_headers(state.alerts.created(E::ENTITY_NAME, id))
        .with_headers(state.alerts.validation(&persisted.validation)))
}

/// PUT /api/{resource} - Overwrite the record named by the body's id
pub async fn update<E: Entity>(
    State(state): State<ResourceState<E>>,
    _identity: Identity,
    Json(record): Json<E>,
) -> ApiResult<E> {
    let persisted = state.resource.update(record).await.map_err(|e| state.reject(e))?;
    let id = persisted.record.id().unwrap_or_default();

    Ok(ApiResponse::success(persisted.record)
        .with_headers(state.alerts.updated(E::ENTITY_NAME, id))
        .with_headers(state.alerts.validation(&persisted.validation)))
}

/// GET /api/{resource} - Records visible to the caller
pub async fn list<E: Entity>(
    State(state): State<ResourceState<E>>,
    identity: Identity,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<E>> {
    let records = state
        .resource
        .list(identity.login(), query.filter.as_deref())
        .await
        .map_err(|e| state.reject(e))?;
    Ok(ApiResponse::success(records))
}

/// GET /api/{resource}/:id
pub async fn show<E: Entity>(
    State(state): State<ResourceState<E>>,
    identity: Identity,
    Path(id): Path<i64>,
) -> ApiResult<E> {
    let record = state
        .resource
        .get(identity.login(), id)
        .await
        .map_err(|e| state.reject(e))?;
    Ok(ApiResponse::success(record))
}

/// DELETE /api/{resource}/:id
pub async fn remove<E: Entity>(
    State(state): State<ResourceState<E>>,
    identity: Identity,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    state
        .resource
        .delete(identity.login(), id)
        .await
        .map_err(|e| state.reject(e))?;
    Ok(ApiResponse::no_content().with_headers(state.alerts.deleted(E::ENTITY_NAME, id)))
}

/// GET /api/_search/{resource}?query=...
pub async fn search<E: Entity>(
    State(state): State<ResourceState<E>>,
    _identity: Identity,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Vec<E>> {
    let records = state.resource.search(&query.query).await.map_err(|e| state.reject(e))?;
    Ok(ApiResponse::success(records))
}
