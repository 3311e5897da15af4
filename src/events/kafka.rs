use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use std::time::Duration;

use super::{EventBus, EventBusError};
use crate::config::KafkaConfig;

/// Kafka producer publishing string payloads without a key
pub struct KafkaEventBus {
    producer: FutureProducer,
    timeout: Duration,
}

impl KafkaEventBus {
    pub fn new(config: &KafkaConfig) -> Result<Self, EventBusError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.bootstrap_servers)
            .set("message.timeout.ms", config.message_timeout_ms.to_string())
            .set("acks", "1")
            .create()
            .map_err(|e| EventBusError::ConnectionFailed(format!("Failed to create producer: {e}")))?;

        tracing::info!(brokers = %config.bootstrap_servers, "Kafka producer initialized");

        Ok(Self {
            producer,
            timeout: Duration::from_millis(config.message_timeout_ms),
        })
    }
}

#[async_trait]
impl EventBus for KafkaEventBus {
    async fn publish(&self, topic: &str, payload: String) -> Result<(), EventBusError> {
        let record: FutureRecord<'_, (), String> = FutureRecord::to(topic).payload(&payload);

        match self.producer.send(record, Timeout::After(self.timeout)).await {
            Ok((partition, offset)) => {
                tracing::debug!(topic = %topic, partition, offset, "Event published");
                Ok(())
            }
            Err((kafka_error, _)) => Err(EventBusError::PublishFailed {
                topic: topic.to_string(),
                reason: kafka_error.to_string(),
            }),
        }
    }
}
