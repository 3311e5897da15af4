// CRUD-with-ownership template shared by every resource
//
// One `ResourceService<E>` per entity type: identifier checks, best-effort
// validation, the store call, then the search mirror and the event emitter.
// The caller's login is passed in explicitly; `None` is an anonymous caller.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;

use crate::database::{DatabaseError, Store};
use crate::domain::ownership::{owns, visible_to};
use crate::domain::{Entity, Persisted};
use crate::events::{EmitOutcome, EventEmitter};
use crate::search::{SearchError, SearchMirror};
use crate::types::Operation;

#[derive(Debug, Error)]
pub enum ResourceError {
    /// Request rejected before any store write
    #[error("{message}")]
    Validation {
        entity: &'static str,
        key: &'static str,
        message: String,
    },

    /// Missing, or owned by somebody else
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("{0} is not searchable")]
    NotSearchable(&'static str),

    #[error(transparent)]
    Store(#[from] DatabaseError),

    #[error(transparent)]
    Search(#[from] SearchError),
}

pub struct ResourceService<E: Entity> {
    store: Arc<dyn Store<E>>,
    events: EventEmitter,
    search: Option<SearchMirror<E>>,
}

impl<E: Entity> ResourceService<E> {
    pub fn new(store: Arc<dyn Store<E>>, events: EventEmitter) -> Self {
        Self {
            store,
            events,
            search: None,
        }
    }

    pub fn with_search(mut self, search: SearchMirror<E>) -> Self {
        self.search = Some(search);
        self
    }

    pub fn is_searchable(&self) -> bool {
        self.search.is_some()
    }

    pub async fn create(&self, record: E) -> Result<Persisted<E>, ResourceError> {
        tracing::debug!("REST request to save {} : {:?}", E::NAME, record);

        if record.id().is_some() {
            return Err(ResourceError::Validation {
                entity: E::ENTITY_NAME,
                key: "idexists",
                message: format!("A new {} cannot already have an ID", E::NAME),
            });
        }

        self.persist(Operation::Create, record).await
    }

    pub async fn update(&self, record: E) -> Result<Persisted<E>, ResourceError> {
        tracing::debug!("REST request to update {} : {:?}", E::NAME, record);

        if record.id().is_none() {
            return Err(ResourceError::Validation {
                entity: E::ENTITY_NAME,
                key: "idnull",
                message: "Invalid id".to_string(),
            });
        }

        self.persist(Operation::Update, record).await
    }

    async fn persist(&self, operation: Operation, record: E) -> Result<Persisted<E>, ResourceError> {
        let validation = record.validate(Utc::now().date_naive());
        if !validation.is_valid() {
            tracing::warn!(
                entity = E::NAME,
                issues = %validation.summary(),
                "Saving {} with invalid data",
                E::NAME
            );
        }

        let saved = self.store.save(record).await?;

        if let Some(search) = &self.search {
            search.reindex(&saved).await;
        }
        self.emit(operation, &saved).await;

        Ok(Persisted {
            record: saved,
            validation,
        })
    }

    /// All records the caller may see. A recognised `filter` name replaces
    /// the ownership filter; unknown names are ignored.
    pub async fn list(&self, principal: Option<&str>, filter: Option<&str>) -> Result<Vec<E>, ResourceError> {
        let records = self.store.find_all().await?;

        if let Some(predicate) = filter.and_then(E::named_filter) {
            tracing::debug!("REST request to get all {}s where {}", E::NAME, filter.unwrap_or_default());
            return Ok(records.into_iter().filter(|record| predicate(record)).collect());
        }

        tracing::debug!("REST request to get all {}s", E::NAME);
        if !E::OWNED {
            return Ok(records);
        }
        Ok(records
            .into_iter()
            .filter(|record| owns(principal, record.owner()))
            .collect())
    }

    pub async fn get(&self, principal: Option<&str>, id: i64) -> Result<E, ResourceError> {
        tracing::debug!("REST request to get {} : {}", E::NAME, id);
        self.find_visible(principal, id).await
    }

    pub async fn delete(&self, principal: Option<&str>, id: i64) -> Result<E, ResourceError> {
        tracing::debug!("REST request to delete {} : {}", E::NAME, id);

        let record = self.find_visible(principal, id).await?;
        self.store.delete_by_id(id).await?;

        if let Some(search) = &self.search {
            search.remove(id).await;
        }
        self.emit(Operation::Delete, &record).await;

        Ok(record)
    }

    pub async fn search(&self, query: &str) -> Result<Vec<E>, ResourceError> {
        tracing::debug!("REST request to search for a page of {}s for query {}", E::NAME, query);

        let search = self.search.as_ref().ok_or(ResourceError::NotSearchable(E::NAME))?;
        Ok(search.query(query).await?)
    }

    pub async fn health(&self) -> Result<(), ResourceError> {
        Ok(self.store.health().await?)
    }

    async fn find_visible(&self, principal: Option<&str>, id: i64) -> Result<E, ResourceError> {
        let not_found = ResourceError::NotFound { entity: E::NAME, id };
        match self.store.find_by_id(id).await? {
            Some(record) if visible_to(principal, &record) => Ok(record),
            _ => Err(not_found),
        }
    }

    async fn emit(&self, operation: Operation, record: &E) {
        if let EmitOutcome::Failed { topic, reason } = self.events.emit(operation, record).await {
            tracing::warn!(entity = E::NAME, topic, reason = %reason, "{} kept without its event", E::NAME);
        }
    }
}

/// Backing-store probe behind `/health`
#[async_trait]
pub trait HealthProbe: Send + Sync {
    fn name(&self) -> &'static str;

    async fn check(&self) -> Result<(), ResourceError>;
}

#[async_trait]
impl<E: Entity> HealthProbe for ResourceService<E> {
    fn name(&self) -> &'static str {
        E::RESOURCE
    }

    async fn check(&self) -> Result<(), ResourceError> {
        self.health().await
    }
}
