use chrono::{DateTime, Utc};
use diesel::prelude::*;
use shared::AuditRecord;
use uuid::Uuid;

use crate::store::{StatusFilter, StatusUpdate};

/// Insert values for the current-state row. `updated_at` is left to the
/// column default so the database clock stamps it.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::order_statuses)]
pub struct NewOrderStatusRow {
    pub id: String,
    pub order_id: String,
    pub status: String,
    pub remark: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::order_status_logs)]
pub struct NewOrderStatusLogRow {
    pub id: Uuid,
    pub order_id: String,
    pub status: String,
    pub remark: String,
    pub created_at: DateTime<Utc>,
}

impl NewOrderStatusRow {
    pub fn new(filter: &StatusFilter, update: &StatusUpdate) -> Self {
        Self {
            id: filter.id.clone(),
            order_id: update.set.order_id.clone(),
            status: update.set.status.clone(),
            remark: update.set.remark.clone(),
            created_at: update.set_on_insert.created_at,
        }
    }
}

impl NewOrderStatusLogRow {
    pub fn new(id: Uuid, record: &AuditRecord) -> Self {
        Self {
            id,
            order_id: record.order_id.clone(),
            status: record.status.clone(),
            remark: record.remark.clone(),
            created_at: record.created_at,
        }
    }
}
