// Domain entities served by the FMS microservices
//
// Every resource is a flat record keyed by a server-assigned `i64`. The
// `Entity` trait carries what the generic resource layer needs to know about
// a record type: where it lives on the HTTP surface, who owns it, how it is
// validated, which named list filters it understands, and which events it
// publishes.

pub mod flight;
pub mod invoice;
pub mod notification;
pub mod ownership;
pub mod passenger;
pub mod payment;

use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;

use crate::types::Operation;

pub use flight::Flight;
pub use invoice::Invoice;
pub use notification::Notification;
pub use passenger::{Passenger, PassengerRegistration};
pub use payment::{CreditCard, Payment};

/// A record type exposed as one REST resource
pub trait Entity: Serialize + DeserializeOwned + Clone + Debug + Send + Sync + 'static {
    /// Singular lowercase name; doubles as the search index name
    const NAME: &'static str;

    /// Plural path segment under `/api`
    const RESOURCE: &'static str;

    /// Name reported in alert headers and bad request errors
    const ENTITY_NAME: &'static str;

    /// Whether list/get/delete are gated by `owner()`
    const OWNED: bool = false;

    fn id(&self) -> Option<i64>;

    fn set_id(&mut self, id: i64);

    /// Login of the owning principal, for ownership-aware resources
    fn owner(&self) -> Option<&str> {
        None
    }

    /// Best-effort domain validation. Never blocks a save.
    fn validate(&self, _today: NaiveDate) -> ValidationOutcome {
        ValidationOutcome::Valid
    }

    /// Predicate for a named list filter (`?filter=...`). A recognised
    /// filter replaces the ownership filter for that call.
    fn named_filter(_name: &str) -> Option<fn(&Self) -> bool> {
        None
    }

    /// Broker topic for a mutation, `None` when nothing is published
    fn topic(_operation: Operation) -> Option<&'static str> {
        None
    }

    /// Reduced view published to the broker
    fn event_payload(&self, _operation: Operation) -> Result<String, ProjectionError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Errors building an event projection
#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    #[error("{entity} has no {field}")]
    MissingField {
        entity: &'static str,
        field: &'static str,
    },

    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
}

/// One failed domain check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub field: &'static str,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Result of the log-and-continue validation run before a save
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ValidationOutcome {
    #[default]
    Valid,
    Invalid(Vec<ValidationIssue>),
}

impl ValidationOutcome {
    pub fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        if issues.is_empty() {
            ValidationOutcome::Valid
        } else {
            ValidationOutcome::Invalid(issues)
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid)
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            ValidationOutcome::Valid => &[],
            ValidationOutcome::Invalid(issues) => issues,
        }
    }

    /// Single-line rendering, e.g. `toPay: Invalid amount to pay; creditCard: ...`
    pub fn summary(&self) -> String {
        self.issues()
            .iter()
            .map(|issue| format!("{}: {}", issue.field, issue.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// A stored record together with the validation verdict it was saved under
#[derive(Debug, Clone)]
pub struct Persisted<E> {
    pub record: E,
    pub validation: ValidationOutcome,
}
