use anyhow::Result;
use serde::Serialize;
use shared::Order;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

use crate::cache::StatusCache;
use crate::repository::OrderRepository;

/// How long a processed order status suppresses repeats.
pub const CACHE_TTL: Duration = Duration::from_secs(60 * 60 * 60);

/// Cache slot of one order/status pair.
pub fn cache_key(order: &Order) -> String {
    format!("{}_{}", order.order_id, order.status)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum ReconcileOutcome {
    /// The order/status pair was already propagated.
    Duplicate,
    Reconciled { applied: bool },
}

pub struct OrderWorkflow {
    repository: Arc<dyn OrderRepository>,
    cache: Arc<dyn StatusCache>,
}

impl OrderWorkflow {
    pub fn new(repository: Arc<dyn OrderRepository>, cache: Arc<dyn StatusCache>) -> Self {
        Self { repository, cache }
    }

    pub async fn save(&self, order: &Order) -> Result<()> {
        self.repository.save_with_id(order).await
    }

    /// Marks the order/status pair as seen.
    pub async fn set(&self, order: &Order) -> Result<()> {
        let value = serde_json::to_string(order)?;
        self.cache.set(&cache_key(order), &value, CACHE_TTL).await
    }

    pub async fn is_exist(&self, order: &Order) -> Result<bool> {
        Ok(self.cache.get(&cache_key(order)).await?.is_some())
    }

    pub async fn send_to_queue(&self, fields: &[String]) -> Result<()> {
        self.repository.send_to_queue(fields).await
    }

    /// Appends the status log entry, then writes the current-state record.
    /// A failed log append skips the current-state write.
    pub async fn upsert(&self, order_id: &str, order: &Order) -> Result<bool> {
        self.repository.set(order).await?;
        self.repository.upsert(order_id, order).await
    }

    /// Processes one incoming status update end to end.
    ///
    /// The cache is written last, so an update whose propagation failed is
    /// attempted again on redelivery.
    #[instrument(skip(self, order), fields(order_id = %order.order_id, status = %order.status))]
    pub async fn reconcile(&self, order: &Order) -> Result<ReconcileOutcome> {
        if self.is_exist(order).await? {
            info!("Order status already reconciled, skipping");
            return Ok(ReconcileOutcome::Duplicate);
        }

        let applied = self.upsert(&order.order_id, order).await?;
        self.save(order).await?;
        self.send_to_queue(&order.to_fields()).await?;
        self.set(order).await?;

        info!(applied, "Order status reconciled");
        Ok(ReconcileOutcome::Reconciled { applied })
    }
}
