use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::info;

use super::memory::SessionTable;
use super::record::SessionRecord;
use super::SessionStore;

/// Session store persisted as a single JSON document
///
/// The whole table is rewritten after every mutation. Writes go to a sibling
/// temporary file first and are renamed into place.
pub struct JsonFileSessionStore {
    path: PathBuf,
    table: Mutex<SessionTable>,
}

impl JsonFileSessionStore {
    /// Open the store, loading existing records if the file is present
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let table = if path.exists() {
            let raw = tokio::fs::read(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_slice(&raw)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .context("Failed to create store directory")?;
            }
            SessionTable::default()
        };

        info!(
            "Session store opened: {} ({} records)",
            path.display(),
            table.rows().len()
        );

        Ok(Self {
            path,
            table: Mutex::new(table),
        })
    }

    async fn flush(&self, table: &SessionTable) -> Result<()> {
        let payload = serde_json::to_vec_pretty(table)?;
        let tmp_path = self.path.with_extension("json.tmp");

        tokio::fs::write(&tmp_path, payload)
            .await
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl SessionStore for JsonFileSessionStore {
    async fn create_active(&self, external_session_id: &str) -> Result<SessionRecord> {
        let mut table = self.table.lock().await;
        let mut staged = table.clone();
        let record = staged.insert_active(external_session_id);

        self.flush(&staged).await?;
        *table = staged;

        Ok(record)
    }

    async fn mark_inactive(&self, record: &SessionRecord) -> Result<SessionRecord> {
        let mut table = self.table.lock().await;
        let mut staged = table.clone();
        let updated = staged.mark_inactive(record)?;

        self.flush(&staged).await?;
        *table = staged;

        Ok(updated)
    }

    async fn most_recent_active(&self) -> Result<Option<SessionRecord>> {
        Ok(self.table.lock().await.most_recent_active())
    }

    async fn list(&self) -> Result<Vec<SessionRecord>> {
        Ok(self.table.lock().await.rows())
    }
}
