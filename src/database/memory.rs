use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

use crate::database::manager::DatabaseError;
use crate::database::repository::Store;
use crate::domain::Entity;

/// Process-local store with a monotonically increasing id sequence
pub struct MemoryStore<E> {
    records: RwLock<BTreeMap<i64, E>>,
    sequence: AtomicI64,
}

impl<E> MemoryStore<E> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            sequence: AtomicI64::new(0),
        }
    }
}

impl<E> Default for MemoryStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: Entity> Store<E> for MemoryStore<E> {
    async fn save(&self, mut record: E) -> Result<E, DatabaseError> {
        // Held across id assignment so a new id and a caller-chosen id never race
        let mut records = self.records.write().await;
        let id = match record.id() {
            Some(id) => {
                // Caller-chosen ids must never be handed out again
                self.sequence.fetch_max(id, Ordering::SeqCst);
                id
            }
            None => {
                let id = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
                record.set_id(id);
                id
            }
        };

        records.insert(id, record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<E>, DatabaseError> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<E>, DatabaseError> {
        Ok(self.records.read().await.values().cloned().collect())
    }

    async fn delete_by_id(&self, id: i64) -> Result<(), DatabaseError> {
        self.records.write().await.remove(&id);
        Ok(())
    }
}
