use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use super::record::SessionRecord;
use super::SessionStore;

/// Ordered table of session records shared by the store implementations
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub(crate) struct SessionTable {
    rows: Vec<SessionRecord>,
}

impl SessionTable {
    pub(crate) fn insert_active(&mut self, external_session_id: &str) -> SessionRecord {
        let record = SessionRecord::new_active(external_session_id);
        self.rows.push(record.clone());
        record
    }

    pub(crate) fn mark_inactive(&mut self, record: &SessionRecord) -> Result<SessionRecord> {
        let row = self
            .rows
            .iter_mut()
            .find(|row| row.id == record.id)
            .ok_or_else(|| anyhow!("Session record {} not found", record.id))?;

        row.close();
        Ok(row.clone())
    }

    pub(crate) fn most_recent_active(&self) -> Option<SessionRecord> {
        // max_by_key keeps the last maximum, so equal timestamps favour the newer row
        self.rows
            .iter()
            .filter(|row| row.active)
            .max_by_key(|row| row.created_at)
            .cloned()
    }

    pub(crate) fn rows(&self) -> Vec<SessionRecord> {
        self.rows.clone()
    }
}

/// Process-local session store
#[derive(Default)]
pub struct MemorySessionStore {
    table: RwLock<SessionTable>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl SessionStore for MemorySessionStore {
    async fn create_active(&self, external_session_id: &str) -> Result<SessionRecord> {
        let record = self.table.write().await.insert_active(external_session_id);
        debug!("Stored session record {} ({})", record.id, external_session_id);
        Ok(record)
    }

    async fn mark_inactive(&self, record: &SessionRecord) -> Result<SessionRecord> {
        self.table.write().await.mark_inactive(record)
    }

    async fn most_recent_active(&self) -> Result<Option<SessionRecord>> {
        Ok(self.table.read().await.most_recent_active())
    }

    async fn list(&self) -> Result<Vec<SessionRecord>> {
        Ok(self.table.read().await.rows())
    }
}
