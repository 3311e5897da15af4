use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

use super::{EventBus, EventBusError};

/// A message accepted by the in-memory bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedEvent {
    pub topic: String,
    pub payload: String,
}

/// Bus that keeps published messages in memory; can be switched to fail
#[derive(Debug, Default)]
pub struct MemoryEventBus {
    events: Mutex<Vec<PublishedEvent>>,
    failing: AtomicBool,
}

impl MemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// A bus whose broker is unreachable
    pub fn failing() -> Self {
        let bus = Self::new();
        bus.set_failing(true);
        bus
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn published(&self) -> Vec<PublishedEvent> {
        self.events.lock().await.clone()
    }

    pub async fn published_to(&self, topic: &str) -> Vec<PublishedEvent> {
        self.events
            .lock()
            .await
            .iter()
            .filter(|event| event.topic == topic)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EventBus for MemoryEventBus {
    async fn publish(&self, topic: &str, payload: String) -> Result<(), EventBusError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(EventBusError::PublishFailed {
                topic: topic.to_string(),
                reason: "broker unavailable".to_string(),
            });
        }

        self.events.lock().await.push(PublishedEvent {
            topic: topic.to_string(),
            payload,
        });
        Ok(())
    }
}
