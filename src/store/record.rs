use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One recording session as persisted by a [`SessionStore`](super::SessionStore)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Store-assigned identifier
    pub id: Uuid,

    /// Identifier issued by the video platform, needed to mint viewer tokens
    pub external_session_id: String,

    /// Whether this is the live session. At most one record is active.
    pub active: bool,

    pub created_at: DateTime<Utc>,

    /// Set on the active -> inactive transition
    pub updated_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new_active(external_session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            external_session_id: external_session_id.into(),
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Active -> inactive, stamping `updated_at`
    pub fn close(&mut self) {
        self.active = false;
        self.updated_at = Utc::now();
    }
}
