use crate::lifecycle::LifecycleStatus;
use crate::store::SessionStore;
use crate::video::VideoPlatform;
use std::sync::Arc;
use tokio::sync::watch;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Source of truth for which session viewers should join
    pub store: Arc<dyn SessionStore>,

    /// Mints viewer tokens
    pub video: Arc<dyn VideoPlatform>,

    /// Latest controller snapshot
    pub status: watch::Receiver<LifecycleStatus>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn SessionStore>,
        video: Arc<dyn VideoPlatform>,
        status: watch::Receiver<LifecycleStatus>,
    ) -> Self {
        Self {
            store,
            video,
            status,
        }
    }
}
