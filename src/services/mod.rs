// Service assembly: which resources a service exposes and what backs them
//
// Every service is the same generic resource template instantiated over a
// different set of entities. Backends are picked from configuration, or
// handed in directly by tests.

use axum::{http::HeaderValue, Extension, Router};
use clap::ValueEnum;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::{Authenticator, JwtError};
use crate::config::AppConfig;
use crate::database::{DatabaseError, DatabaseManager, MemoryStore, PgEntity, Repository, Store};
use crate::domain::{Entity, Flight, Invoice, Notification, Passenger, Payment};
use crate::events::{EventBusError, EventEmitter};
use crate::handlers::{health_routes, registration_routes, resource_routes, HealthState, ResourceState};
use crate::middleware::Alerts;
use crate::resource::{HealthProbe, ResourceService};
use crate::search::{ElasticsearchEngine, MemorySearchEngine, SearchEngine, SearchError, SearchMirror};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ServiceKind {
    Payments,
    Flights,
    Passengers,
    Notifications,
}

impl ServiceKind {
    pub fn name(&self) -> &'static str {
        match self {
            ServiceKind::Payments => "payments",
            ServiceKind::Flights => "flights",
            ServiceKind::Passengers => "passengers",
            ServiceKind::Notifications => "notifications",
        }
    }

    /// Each service owns its own database
    pub fn database_name(&self) -> &'static str {
        match self {
            ServiceKind::Payments => "fms_payments",
            ServiceKind::Flights => "fms_flights",
            ServiceKind::Passengers => "fms_passengers",
            ServiceKind::Notifications => "fms_notifications",
        }
    }

    pub fn resources(&self) -> Vec<&'static str> {
        match self {
            ServiceKind::Payments => vec![Invoice::RESOURCE, Payment::RESOURCE],
            ServiceKind::Flights => vec![Flight::RESOURCE],
            ServiceKind::Passengers => vec![Passenger::RESOURCE],
            ServiceKind::Notifications => vec![Notification::RESOURCE],
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Events(#[from] EventBusError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Auth(#[from] JwtError),
}

#[derive(Clone)]
pub enum StoreBackend {
    Memory,
    Postgres(PgPool),
}

impl StoreBackend {
    pub fn store<E: PgEntity>(&self) -> Arc<dyn Store<E>> {
        match self {
            StoreBackend::Memory => Arc::new(MemoryStore::<E>::new()),
            StoreBackend::Postgres(pool) => Arc::new(Repository::<E>::new(pool.clone())),
        }
    }
}

#[derive(Clone)]
pub enum SearchBackend {
    Memory,
    Elasticsearch(crate::config::SearchConfig),
}

impl SearchBackend {
    pub fn mirror<E: Entity>(&self) -> Result<SearchMirror<E>, SearchError> {
        let engine: Arc<dyn SearchEngine<E>> = match self {
            SearchBackend::Memory => Arc::new(MemorySearchEngine::<E>::new()),
            SearchBackend::Elasticsearch(config) => Arc::new(ElasticsearchEngine::<E>::new(config)?),
        };
        Ok(SearchMirror::new(engine))
    }
}

/// Infrastructure a service runs against
#[derive(Clone)]
pub struct Backends {
    pub store: StoreBackend,
    pub events: EventEmitter,
    pub search: SearchBackend,
}

impl Backends {
    /// Everything in process; events only reach the log
    pub fn in_memory() -> Self {
        Self {
            store: StoreBackend::Memory,
            events: EventEmitter::logging(),
            search: SearchBackend::Memory,
        }
    }

    pub async fn from_config(kind: ServiceKind, config: &AppConfig) -> Result<Self, ServiceError> {
        let store = match (&config.database.url, config.database.in_memory) {
            (Some(_), false) => {
                let pool = DatabaseManager::service_pool(kind.database_name(), &config.database).await?;
                StoreBackend::Postgres(pool)
            }
            (None, false) => return Err(DatabaseError::ConfigMissing("DATABASE_URL").into()),
            (_, true) => {
                tracing::warn!("Using in-memory store, records are lost on shutdown");
                StoreBackend::Memory
            }
        };

        let search = if config.search.enabled {
            SearchBackend::Elasticsearch(config.search.clone())
        } else {
            SearchBackend::Memory
        };

        Ok(Self {
            store,
            events: Self::events(config)?,
            search,
        })
    }

    #[cfg(feature = "kafka")]
    fn events(config: &AppConfig) -> Result<EventEmitter, ServiceError> {
        if !config.kafka.enabled {
            return Ok(EventEmitter::logging());
        }
        let bus = crate::events::kafka::KafkaEventBus::new(&config.kafka)?;
        Ok(EventEmitter::new(Arc::new(bus)))
    }

    #[cfg(not(feature = "kafka"))]
    fn events(config: &AppConfig) -> Result<EventEmitter, ServiceError> {
        if config.kafka.enabled {
            tracing::warn!("Kafka is enabled but this build lacks the `kafka` feature; events are only logged");
        }
        Ok(EventEmitter::logging())
    }
}

/// Routes, state and probes collected while assembling one service
struct Assembly<'a> {
    backends: &'a Backends,
    alerts: Alerts,
    router: Router,
    probes: Vec<Arc<dyn HealthProbe>>,
}

impl<'a> Assembly<'a> {
    fn resource<E: PgEntity>(&mut self, searchable: bool) -> Result<ResourceState<E>, ServiceError> {
        let mut service = ResourceService::new(self.backends.store.store::<E>(), self.backends.events.clone());
        if searchable {
            service = service.with_search(self.backends.search.mirror::<E>()?);
        }

        let service = Arc::new(service);
        self.probes.push(service.clone());

        let state = ResourceState::new(service, self.alerts.clone());
        let router = std::mem::take(&mut self.router);
        self.router = router.merge(resource_routes::<E>(state.clone()));
        Ok(state)
    }
}

pub fn build_router(kind: ServiceKind, backends: &Backends, config: &AppConfig) -> Result<Router, ServiceError> {
    let mut assembly = Assembly {
        backends,
        alerts: Alerts::new(config.server.application_name.clone()),
        router: Router::new(),
        probes: Vec::new(),
    };

    match kind {
        ServiceKind::Payments => {
            assembly.resource::<Invoice>(false)?;
            assembly.resource::<Payment>(false)?;
        }
        ServiceKind::Flights => {
            assembly.resource::<Flight>(false)?;
        }
        ServiceKind::Passengers => {
            let passengers = assembly.resource::<Passenger>(false)?;
            let router = std::mem::take(&mut assembly.router);
            assembly.router = router.merge(registration_routes(passengers));
        }
        ServiceKind::Notifications => {
            assembly.resource::<Notification>(true)?;
        }
    }

    let health = HealthState {
        service: kind.name(),
        resources: kind.resources(),
        probes: assembly.probes,
    };

    let authenticator = Authenticator::new(&config.security.jwt_secret)?;
    let router = assembly
        .router
        .merge(health_routes(health))
        .layer(Extension(authenticator))
        .layer(TraceLayer::new_for_http());

    Ok(match cors_layer(config) {
        Some(cors) => router.layer(cors),
        None => router,
    })
}

fn cors_layer(config: &AppConfig) -> Option<CorsLayer> {
    if !config.security.enable_cors {
        return None;
    }
    if config.security.cors_origins.iter().any(|origin| origin == "*") {
        return Some(CorsLayer::permissive());
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();
    Some(
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
            .expose_headers(Any),
    )
}
