// Side-effect emitter: best-effort publication of domain events
//
// The store write has already been committed when an event is emitted, so
// nothing here can fail the request. Projection and broker errors are logged
// and reported back as an `EmitOutcome`, never retried.

#[cfg(feature = "kafka")]
pub mod kafka;
pub mod memory;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::Entity;
use crate::types::Operation;

pub use memory::MemoryEventBus;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EventBusError {
    #[error("Failed to connect to broker: {0}")]
    ConnectionFailed(String),

    #[error("Failed to publish to {topic}: {reason}")]
    PublishFailed { topic: String, reason: String },
}

/// Producer side of the message broker
#[async_trait]
pub trait EventBus: Send + Sync {
    async fn publish(&self, topic: &str, payload: String) -> Result<(), EventBusError>;
}

/// Bus used when no broker is configured: events only reach the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingEventBus;

#[async_trait]
impl EventBus for LoggingEventBus {
    async fn publish(&self, topic: &str, payload: String) -> Result<(), EventBusError> {
        tracing::info!(topic = %topic, payload = %payload, "Event not sent, no broker configured");
        Ok(())
    }
}

/// What happened to one emitted event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmitOutcome {
    Published { topic: &'static str },
    /// The entity publishes nothing for this operation
    Skipped,
    Failed { topic: &'static str, reason: String },
}

/// Serializes entity projections and hands them to the bus
#[derive(Clone)]
pub struct EventEmitter {
    bus: Arc<dyn EventBus>,
}

impl EventEmitter {
    pub fn new(bus: Arc<dyn EventBus>) -> Self {
        Self { bus }
    }

    pub fn logging() -> Self {
        Self::new(Arc::new(LoggingEventBus))
    }

    pub async fn emit<E: Entity>(&self, operation: Operation, record: &E) -> EmitOutcome {
        let Some(topic) = E::topic(operation) else {
            return EmitOutcome::Skipped;
        };

        let payload = match record.event_payload(operation) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(topic = %topic, error = %e, "Cannot build event payload");
                return EmitOutcome::Failed {
                    topic,
                    reason: e.to_string(),
                };
            }
        };

        tracing::debug!("Produced an event for topic {} : {}", topic, payload);

        match self.bus.publish(topic, payload).await {
            Ok(()) => EmitOutcome::Published { topic },
            Err(e) => {
                tracing::error!(topic = %topic, error = %e, "Event dropped");
                EmitOutcome::Failed {
                    topic,
                    reason: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Flight, Passenger, Payment};

    fn saved_payment() -> Payment {
        Payment {
            id: Some(1),
            booking_number: Some(77),
            to_pay: Some(10.0),
            passenger_id: Some("alice".to_string()),
            credit_card: None,
        }
    }

    #[tokio::test]
    async fn publishes_projection_to_entity_topic() {
        let bus = Arc::new(MemoryEventBus::new());
        let emitter = EventEmitter::new(bus.clone());

        let outcome = emitter.emit(Operation::Create, &saved_payment()).await;

        assert_eq!(outcome, EmitOutcome::Published { topic: "payment_set" });
        let published = bus.published().await;
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].topic, "payment_set");
        assert!(published[0].payload.contains("\"bookingNumber\":\"77\""));
    }

    #[tokio::test]
    async fn entities_without_topics_are_skipped() {
        let bus = Arc::new(MemoryEventBus::new());
        let emitter = EventEmitter::new(bus.clone());

        let outcome = emitter.emit(Operation::Create, &Passenger::default()).await;

        assert_eq!(outcome, EmitOutcome::Skipped);
        assert!(bus.published().await.is_empty());
    }

    #[tokio::test]
    async fn broker_failures_are_reported_not_raised() {
        let bus = Arc::new(MemoryEventBus::failing());
        let emitter = EventEmitter::new(bus.clone());

        let outcome = emitter.emit(Operation::Create, &saved_payment()).await;

        assert!(matches!(outcome, EmitOutcome::Failed { topic: "payment_set", .. }));
        assert!(bus.published().await.is_empty());
    }

    #[tokio::test]
    async fn projection_failures_never_reach_the_bus() {
        let bus = Arc::new(MemoryEventBus::new());
        let emitter = EventEmitter::new(bus.clone());

        let outcome = emitter.emit(Operation::Update, &Flight::default()).await;

        assert!(matches!(outcome, EmitOutcome::Failed { topic: "flight_updated", .. }));
        assert!(bus.published().await.is_empty());
    }

    #[tokio::test]
    async fn logging_bus_accepts_everything() {
        let emitter = EventEmitter::logging();
        let outcome = emitter.emit(Operation::Create, &saved_payment()).await;
        assert_eq!(outcome, EmitOutcome::Published { topic: "payment_set" });
    }
}
