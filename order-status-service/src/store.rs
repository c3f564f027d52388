use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::now;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_builder::{QueryFragment, QueryId};
use diesel::upsert::excluded;
use diesel_async::{pooled_connection::bb8::Pool, AsyncPgConnection, RunQueryDsl};
use shared::{AuditRecord, Order};
use tracing::debug;
use uuid::Uuid;

use crate::models::{NewOrderStatusLogRow, NewOrderStatusRow};
use crate::schema::{order_status_logs, order_statuses};

type DbPool = Pool<AsyncPgConnection>;

pub type DocumentId = Uuid;

const STATUS_ID_PREFIX: &str = "order_";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    /// Current state, one document per order.
    OrderStatus,
    /// Append-only status log.
    OrderStatusLog,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::OrderStatus => "order_statuses",
            Collection::OrderStatusLog => "order_status_logs",
        }
    }
}

/// Selects the current-state document of one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusFilter {
    pub id: String,
}

impl StatusFilter {
    pub fn by_order_id(order_id: &str) -> Self {
        Self {
            id: format!("{}{}", STATUS_ID_PREFIX, order_id),
        }
    }
}

/// Fields written only when the upsert inserts a new document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetOnInsert {
    pub created_at: DateTime<Utc>,
}

/// Fields stamped with the store's own clock on every write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrentDate {
    UpdatedAt,
}

/// Update-or-insert document for the current-state record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub set: Order,
    pub set_on_insert: SetOnInsert,
    pub current_date: CurrentDate,
}

impl StatusUpdate {
    pub fn new(order: &Order, created_at: DateTime<Utc>) -> Self {
        Self {
            set: order.clone(),
            set_on_insert: SetOnInsert { created_at },
            current_date: CurrentDate::UpdatedAt,
        }
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Updates the document matching `filter`, inserting it when absent.
    /// Returns whether a document was written.
    ///
    /// Always an upsert, so there is no separate write-options argument.
    async fn update_or_insert(
        &self,
        collection: Collection,
        filter: &StatusFilter,
        update: &StatusUpdate,
    ) -> Result<bool>;

    async fn insert_one(&self, collection: Collection, document: &AuditRecord) -> Result<DocumentId>;
}

/// `INSERT .. ON CONFLICT (id) DO UPDATE` for the current-state row.
/// `created_at` only appears in the insert values.
fn upsert_status_query(
    filter: &StatusFilter,
    update: &StatusUpdate,
) -> impl QueryFragment<Pg> + QueryId + Send {
    let row = NewOrderStatusRow::new(filter, update);

    match update.current_date {
        CurrentDate::UpdatedAt => diesel::insert_into(order_statuses::table)
            .values(row)
            .on_conflict(order_statuses::id)
            .do_update()
            .set((
                order_statuses::order_id.eq(excluded(order_statuses::order_id)),
                order_statuses::status.eq(excluded(order_statuses::status)),
                order_statuses::remark.eq(excluded(order_statuses::remark)),
                order_statuses::updated_at.eq(now),
            )),
    }
}

pub struct PgDocumentStore {
    pool: DbPool,
}

impl PgDocumentStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn update_or_insert(
        &self,
        collection: Collection,
        filter: &StatusFilter,
        update: &StatusUpdate,
    ) -> Result<bool> {
        if collection != Collection::OrderStatus {
            bail!("{} does not hold current-state documents", collection.name());
        }

        let mut conn = self.pool.get().await?;
        let affected = upsert_status_query(filter, update)
            .execute(&mut conn)
            .await?;

        debug!(id = %filter.id, affected, "upserted order status");
        Ok(affected > 0)
    }

    async fn insert_one(&self, collection: Collection, document: &AuditRecord) -> Result<DocumentId> {
        if collection != Collection::OrderStatusLog {
            bail!("{} does not accept log inserts", collection.name());
        }

        let mut conn = self.pool.get().await?;
        let id = Uuid::new_v4();

        diesel::insert_into(order_status_logs::table)
            .values(&NewOrderStatusLogRow::new(id, document))
            .execute(&mut conn)
            .await?;

        debug!(%id, order_id = %document.order_id, "appended order status log");
        Ok(id)
    }
}
