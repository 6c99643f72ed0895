use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::mcp::Dispatcher;
use crate::tools::ToolRegistry;

use super::record::SessionRecord;
use super::store::SessionStore;

/// Whether a dispatcher persists per session across exchanges, or is
/// rebuilt per exchange with no identifier issued. Stateless fits
/// deployments where routing cannot pin a client to one process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    Stateful,
    Stateless,
}

/// Drives session creation, lookup, exactly-once teardown, and
/// process-shutdown cleanup over the injected store.
pub struct LifecycleController {
    mode: SessionMode,
    store: Arc<dyn SessionStore>,
    tools: Arc<ToolRegistry>,
}

impl LifecycleController {
    pub fn new(mode: SessionMode, store: Arc<dyn SessionStore>, tools: Arc<ToolRegistry>) -> Self {
        Self { mode, store, tools }
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Fresh dispatcher for a single stateless exchange.
    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(self.tools.clone())
    }

    /// Mints an identifier, builds the record with its own dispatcher, and
    /// registers it. The record reaches the store only fully constructed,
    /// and a colliding identifier is discarded rather than reused.
    pub async fn create_session(&self) -> Arc<SessionRecord> {
        loop {
            let id = Uuid::new_v4().to_string();
            let record = SessionRecord::new(id, Dispatcher::new(self.tools.clone()));
            if self.store.insert_if_absent(record.clone()).await {
                return record;
            }
        }
    }

    /// Resolves an identifier to a live session. Records already in
    /// teardown are treated as absent.
    pub async fn resolve(&self, id: &str) -> Option<Arc<SessionRecord>> {
        let record = self.store.lookup(id).await?;
        if record.is_closed() {
            return None;
        }
        Some(record)
    }

    /// Tears the session down exactly once: whichever caller wins the
    /// record's closed flag removes the registry entry and closes the push
    /// channel; every other concurrent caller is a no-op.
    pub async fn terminate(&self, id: &str) -> bool {
        let Some(record) = self.store.lookup(id).await else {
            return false;
        };
        if !record.begin_close() {
            return false;
        }

        self.store.remove(record.id()).await;
        record.finish_close().await;
        info!(session = %record.id(), "session closed");
        true
    }

    /// Process-shutdown cleanup. Entries are removed from the store before
    /// their close actions run, so a close path that fires during teardown
    /// finds nothing left to remove.
    pub async fn shutdown(&self) {
        let records = self.store.drain().await;
        let drained = records.len();
        for record in records {
            if record.begin_close() {
                record.finish_close().await;
            }
        }
        if drained > 0 {
            info!(sessions = drained, "session registry drained");
        }
    }
}
