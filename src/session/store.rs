use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::record::SessionRecord;

/// Injectable registry keyed by session identifier. The backing structure
/// is swappable without touching transport logic.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Registers a fully-constructed record. Returns `false` when the
    /// identifier is already present; an existing entry is never
    /// overwritten.
    async fn insert_if_absent(&self, record: Arc<SessionRecord>) -> bool;

    async fn lookup(&self, id: &str) -> Option<Arc<SessionRecord>>;

    /// Idempotent: removing an absent identifier is a no-op.
    async fn remove(&self, id: &str) -> Option<Arc<SessionRecord>>;

    /// Empties the store, handing every record to the caller.
    async fn drain(&self) -> Vec<Arc<SessionRecord>>;

    async fn count(&self) -> usize;
}

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Arc<SessionRecord>>>,
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn insert_if_absent(&self, record: Arc<SessionRecord>) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.entry(record.id().to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(record);
                true
            }
        }
    }

    async fn lookup(&self, id: &str) -> Option<Arc<SessionRecord>> {
        self.sessions.read().await.get(id).cloned()
    }

    async fn remove(&self, id: &str) -> Option<Arc<SessionRecord>> {
        self.sessions.write().await.remove(id)
    }

    async fn drain(&self) -> Vec<Arc<SessionRecord>> {
        self.sessions
            .write()
            .await
            .drain()
            .map(|(_, record)| record)
            .collect()
    }

    async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
