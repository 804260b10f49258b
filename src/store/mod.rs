//! Session record persistence
//!
//! The lifecycle controller only creates records and marks them inactive.
//! `most_recent_active` serves the viewer API, which trusts the store rather
//! than the controller's in-memory state.

mod file;
mod memory;
mod record;

pub use file::JsonFileSessionStore;
pub use memory::MemorySessionStore;
pub use record::SessionRecord;

use anyhow::Result;

#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a new record with `active = true`
    async fn create_active(&self, external_session_id: &str) -> Result<SessionRecord>;

    /// Set `active = false` and bump `updated_at`, returning the stored row
    async fn mark_inactive(&self, record: &SessionRecord) -> Result<SessionRecord>;

    /// Newest active record by creation time, if any
    async fn most_recent_active(&self) -> Result<Option<SessionRecord>>;

    /// All records, oldest first
    async fn list(&self) -> Result<Vec<SessionRecord>>;
}
