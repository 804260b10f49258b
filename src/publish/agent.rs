use anyhow::Result;
use uuid::Uuid;

/// Opaque handle to one running capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishHandle {
    pub id: Uuid,
    /// Remote session the capture is publishing into
    pub session_id: String,
}

impl PublishHandle {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id: session_id.into(),
        }
    }
}

/// Drives local audio/video capture into a remote session
///
/// Callers always pair `stop` with a following `release`, including when
/// capture already failed. A failed `start` must not leave resources behind.
#[async_trait::async_trait]
pub trait PublishAgent: Send + Sync {
    /// Begin capturing into the named remote session
    async fn start(&self, session_id: &str) -> Result<PublishHandle>;

    /// Gracefully end capture; no capture writes happen afterwards
    async fn stop(&self, handle: &PublishHandle) -> Result<()>;

    /// Free the resources behind the handle
    async fn release(&self, handle: PublishHandle) -> Result<()>;

    /// Get agent name for logging
    fn name(&self) -> &str;
}
