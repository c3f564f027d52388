use anyhow::Result;
use async_trait::async_trait;
use shared::{AuditRecord, Order, OrderStatus};
use std::sync::Arc;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::order_api::OrderApi;
use crate::queue::MessageQueue;
use crate::store::{Collection, DocumentId, DocumentStore, StatusFilter, StatusUpdate};

/// Durable writes, queue publication and partner API calls for order status.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Forwards the order unchanged to the partner order API.
    async fn save_with_id(&self, order: &Order) -> Result<()>;

    /// Writes the current-state record of `order_id`.
    async fn upsert(&self, order_id: &str, order: &Order) -> Result<bool>;

    /// Appends a snapshot of `order` to the status log.
    async fn set(&self, order: &Order) -> Result<DocumentId>;

    /// Publishes `[order_id, status, remark]` as an `OrderStatus` event.
    async fn send_to_queue(&self, fields: &[String]) -> Result<()>;
}

pub struct ReconciliationRepository {
    store: Arc<dyn DocumentStore>,
    queue: Arc<dyn MessageQueue>,
    order_api: Arc<dyn OrderApi>,
    clock: Arc<dyn Clock>,
    queue_name: String,
}

impl ReconciliationRepository {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        queue: Arc<dyn MessageQueue>,
        order_api: Arc<dyn OrderApi>,
        clock: Arc<dyn Clock>,
        queue_name: String,
    ) -> Self {
        Self {
            store,
            queue,
            order_api,
            clock,
            queue_name,
        }
    }
}

#[async_trait]
impl OrderRepository for ReconciliationRepository {
    async fn save_with_id(&self, order: &Order) -> Result<()> {
        self.order_api.save_order(order).await
    }

    async fn upsert(&self, order_id: &str, order: &Order) -> Result<bool> {
        let filter = StatusFilter::by_order_id(order_id);
        let update = StatusUpdate::new(order, self.clock.now());

        let applied = self
            .store
            .update_or_insert(Collection::OrderStatus, &filter, &update)
            .await?;

        debug!(id = %filter.id, applied, "order status upsert");
        Ok(applied)
    }

    async fn set(&self, order: &Order) -> Result<DocumentId> {
        let record = AuditRecord::new(order, self.clock.now());
        self.store.insert_one(Collection::OrderStatusLog, &record).await
    }

    async fn send_to_queue(&self, fields: &[String]) -> Result<()> {
        let status = OrderStatus::from_fields(fields)?;
        let body = serde_json::to_vec(&status)?;

        self.queue.publish(&self.queue_name, &body).await?;

        info!(
            queue = %self.queue_name,
            order_id = %status.order_id,
            status = %status.status,
            "Published order status"
        );
        Ok(())
    }
}
