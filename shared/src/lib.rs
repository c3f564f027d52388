use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A shipping order as reported by the upstream partner.
///
/// `Order::default()` is the empty sentinel: it carries no id and is never
/// persisted on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    #[serde(default)]
    pub order_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub remark: String,
}

/// Event payload published whenever an order changes status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatus {
    pub order_id: String,
    pub status: String,
    pub remark: String,
}

/// Append-only snapshot of an order written to the status log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub order_id: String,
    pub status: String,
    pub remark: String,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn new(
        order_id: impl Into<String>,
        status: impl Into<String>,
        remark: impl Into<String>,
    ) -> Self {
        Self {
            order_id: order_id.into(),
            status: status.into(),
            remark: remark.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.order_id.is_empty()
    }

    /// Ordered field sequence used for queue publication.
    pub fn to_fields(&self) -> Vec<String> {
        vec![
            self.order_id.clone(),
            self.status.clone(),
            self.remark.clone(),
        ]
    }
}

impl OrderStatus {
    /// Builds the payload from `[order_id, status, remark]`.
    pub fn from_fields(fields: &[String]) -> Result<Self> {
        match fields {
            [order_id, status, remark] => Ok(Self {
                order_id: order_id.clone(),
                status: status.clone(),
                remark: remark.clone(),
            }),
            _ => bail!(
                "expected 3 order status fields (order_id, status, remark), got {}",
                fields.len()
            ),
        }
    }
}

impl From<&Order> for OrderStatus {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.order_id.clone(),
            status: order.status.clone(),
            remark: order.remark.clone(),
        }
    }
}

impl AuditRecord {
    pub fn new(order: &Order, created_at: DateTime<Utc>) -> Self {
        Self {
            order_id: order.order_id.clone(),
            status: order.status.clone(),
            remark: order.remark.clone(),
            created_at,
        }
    }
}
