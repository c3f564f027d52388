use anyhow::Result;
use futures::StreamExt;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::{Message, Offset};
use shared::Order;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};

use crate::usecase::{OrderWorkflow, ReconcileOutcome};

const RETRY_DELAY: Duration = Duration::from_secs(1);

/// An update that can never be reconciled, however often it is redelivered.
#[derive(Debug)]
pub struct InvalidUpdate(String);

impl fmt::Display for InvalidUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid order update: {}", self.0)
    }
}

impl std::error::Error for InvalidUpdate {}

/// Whether the offset of a handled update may be committed. Failed
/// reconciliations stay uncommitted so the update is delivered again.
pub fn should_commit(result: &Result<ReconcileOutcome>) -> bool {
    match result {
        Ok(_) => true,
        Err(e) => e.is::<InvalidUpdate>(),
    }
}

/// Consumes raw order status updates and reconciles each one.
pub struct UpdateHandler {
    workflow: Arc<OrderWorkflow>,
}

impl UpdateHandler {
    pub fn new(workflow: Arc<OrderWorkflow>) -> Self {
        Self { workflow }
    }

    /// Expects a consumer with `enable.auto.commit=false`.
    pub async fn run(&self, consumer: StreamConsumer) {
        let mut message_stream = consumer.stream();

        while let Some(message) = message_stream.next().await {
            match message {
                Ok(m) => {
                    let result = match m.payload_view::<str>() {
                        Some(Ok(json_str)) => self.handle_payload(json_str).await,
                        Some(Err(e)) => Err(InvalidUpdate(format!("payload is not utf-8: {}", e)).into()),
                        None => Err(InvalidUpdate("empty payload".to_string()).into()),
                    };

                    if let Err(e) = &result {
                        error!("Error handling order update: {}", e);
                    }

                    if should_commit(&result) {
                        if let Err(e) = consumer.commit_message(&m, CommitMode::Async) {
                            error!("Error committing message: {}", e);
                        }
                        continue;
                    }

                    warn!(
                        topic = m.topic(),
                        partition = m.partition(),
                        offset = m.offset(),
                        "Order update not reconciled, retrying"
                    );
                    if let Err(e) = consumer.seek(
                        m.topic(),
                        m.partition(),
                        Offset::Offset(m.offset()),
                        Duration::from_secs(5),
                    ) {
                        error!("Error seeking back to failed update: {}", e);
                    }
                    tokio::time::sleep(RETRY_DELAY).await;
                }
                Err(e) => error!("Error receiving message: {}", e),
            }
        }
    }

    pub async fn handle_payload(&self, json_str: &str) -> Result<ReconcileOutcome> {
        let order: Order = serde_json::from_str(json_str)
            .map_err(|e| InvalidUpdate(format!("malformed json: {}", e)))?;
        if order.is_empty() {
            return Err(InvalidUpdate("missing order_id".to_string()).into());
        }
        self.workflow.reconcile(&order).await
    }
}
