//! Recording doubles for the collaborator traits.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::{AuditRecord, Order};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use crate::cache::StatusCache;
use crate::clock::Clock;
use crate::order_api::OrderApi;
use crate::queue::MessageQueue;
use crate::repository::OrderRepository;
use crate::store::{Collection, CurrentDate, DocumentId, DocumentStore, StatusFilter, StatusUpdate};

/// Optional canned error returned instead of performing the call.
#[derive(Debug, Default)]
pub struct Failure(Mutex<Option<String>>);

impl Failure {
    pub fn set(&self, message: &str) {
        *self.0.lock().unwrap() = Some(message.to_string());
    }

    pub fn clear(&self) {
        *self.0.lock().unwrap() = None;
    }

    fn check(&self) -> Result<()> {
        match self.0.lock().unwrap().as_ref() {
            Some(message) => Err(anyhow::anyhow!(message.clone())),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredStatus {
    pub order: Order,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Document store that applies the update clauses the way the real store
/// does. `server_clock` stands in for the database clock.
pub struct InMemoryDocumentStore {
    server_clock: Arc<dyn Clock>,
    pub statuses: Mutex<HashMap<String, StoredStatus>>,
    pub log: Mutex<Vec<(DocumentId, Collection, AuditRecord)>>,
    pub upserts: Mutex<Vec<(Collection, StatusFilter, StatusUpdate)>>,
    pub fail_upsert: Failure,
    pub fail_insert: Failure,
}

impl InMemoryDocumentStore {
    pub fn new(server_clock: Arc<dyn Clock>) -> Self {
        Self {
            server_clock,
            statuses: Mutex::new(HashMap::new()),
            log: Mutex::new(Vec::new()),
            upserts: Mutex::new(Vec::new()),
            fail_upsert: Failure::default(),
            fail_insert: Failure::default(),
        }
    }

    pub fn status(&self, id: &str) -> Option<StoredStatus> {
        self.statuses.lock().unwrap().get(id).cloned()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn update_or_insert(
        &self,
        collection: Collection,
        filter: &StatusFilter,
        update: &StatusUpdate,
    ) -> Result<bool> {
        self.upserts
            .lock()
            .unwrap()
            .push((collection, filter.clone(), update.clone()));
        self.fail_upsert.check()?;

        let server_now = self.server_clock.now();
        let mut statuses = self.statuses.lock().unwrap();
        let entry = statuses.entry(filter.id.clone()).or_insert_with(|| StoredStatus {
            order: update.set.clone(),
            created_at: update.set_on_insert.created_at,
            updated_at: server_now,
        });
        entry.order = update.set.clone();
        match update.current_date {
            CurrentDate::UpdatedAt => entry.updated_at = server_now,
        }
        Ok(true)
    }

    async fn insert_one(&self, collection: Collection, document: &AuditRecord) -> Result<DocumentId> {
        self.fail_insert.check()?;
        let id = Uuid::new_v4();
        self.log.lock().unwrap().push((id, collection, document.clone()));
        Ok(id)
    }
}

#[derive(Default)]
pub struct MemoryCache {
    pub entries: Mutex<HashMap<String, (String, Duration)>>,
    pub gets: Mutex<Vec<String>>,
    pub fail_get: Failure,
    pub fail_set: Failure,
}

impl MemoryCache {
    pub fn entry(&self, key: &str) -> Option<(String, Duration)> {
        self.entries.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl StatusCache for MemoryCache {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.fail_set.check()?;
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value.to_string(), ttl));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.gets.lock().unwrap().push(key.to_string());
        self.fail_get.check()?;
        Ok(self.entry(key).map(|(value, _)| value))
    }
}

#[derive(Default)]
pub struct RecordingQueue {
    pub published: Mutex<Vec<(String, Vec<u8>)>>,
    pub fail: Failure,
}

#[async_trait]
impl MessageQueue for RecordingQueue {
    async fn publish(&self, queue_name: &str, payload: &[u8]) -> Result<()> {
        self.fail.check()?;
        self.published
            .lock()
            .unwrap()
            .push((queue_name.to_string(), payload.to_vec()));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingOrderApi {
    pub saved: Mutex<Vec<Order>>,
    pub fail: Failure,
}

#[async_trait]
impl OrderApi for RecordingOrderApi {
    async fn save_order(&self, order: &Order) -> Result<()> {
        self.fail.check()?;
        self.saved.lock().unwrap().push(order.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoCall {
    SaveWithId(Order),
    Upsert(String, Order),
    Set(Order),
    SendToQueue(Vec<String>),
}

/// Repository double that records every call in order.
pub struct RecordingRepository {
    pub calls: Mutex<Vec<RepoCall>>,
    pub upsert_applied: Mutex<bool>,
    pub fail_save_with_id: Failure,
    pub fail_upsert: Failure,
    pub fail_set: Failure,
    pub fail_send_to_queue: Failure,
}

impl Default for RecordingRepository {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            upsert_applied: Mutex::new(true),
            fail_save_with_id: Failure::default(),
            fail_upsert: Failure::default(),
            fail_set: Failure::default(),
            fail_send_to_queue: Failure::default(),
        }
    }
}

impl RecordingRepository {
    pub fn calls(&self) -> Vec<RepoCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: RepoCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl OrderRepository for RecordingRepository {
    async fn save_with_id(&self, order: &Order) -> Result<()> {
        self.record(RepoCall::SaveWithId(order.clone()));
        self.fail_save_with_id.check()
    }

    async fn upsert(&self, order_id: &str, order: &Order) -> Result<bool> {
        self.record(RepoCall::Upsert(order_id.to_string(), order.clone()));
        self.fail_upsert.check()?;
        Ok(*self.upsert_applied.lock().unwrap())
    }

    async fn set(&self, order: &Order) -> Result<DocumentId> {
        self.record(RepoCall::Set(order.clone()));
        self.fail_set.check()?;
        Ok(Uuid::new_v4())
    }

    async fn send_to_queue(&self, fields: &[String]) -> Result<()> {
        self.record(RepoCall::SendToQueue(fields.to_vec()));
        self.fail_send_to_queue.check()
    }
}
