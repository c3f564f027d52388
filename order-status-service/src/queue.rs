use anyhow::Result;
use async_trait::async_trait;
use rdkafka::producer::{FutureProducer, FutureRecord};
use std::time::Duration;

#[async_trait]
pub trait MessageQueue: Send + Sync {
    async fn publish(&self, queue_name: &str, payload: &[u8]) -> Result<()>;
}

/// Publishes to the Kafka topic named after the queue.
pub struct KafkaMessageQueue {
    producer: FutureProducer,
}

impl KafkaMessageQueue {
    pub fn new(producer: FutureProducer) -> Self {
        Self { producer }
    }
}

#[async_trait]
impl MessageQueue for KafkaMessageQueue {
    async fn publish(&self, queue_name: &str, payload: &[u8]) -> Result<()> {
        let record = FutureRecord::<(), [u8]>::to(queue_name).payload(payload);

        self.producer
            .send(record, Duration::from_secs(5))
            .await
            .map_err(|(e, _)| anyhow::anyhow!("Failed to publish to {}: {}", queue_name, e))?;

        Ok(())
    }
}
