use serde::Deserialize;
use std::time::Duration;

use crate::video::MediaMode;

/// Timing and platform settings for each session
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How long capture runs once publishing has started (D)
    pub duration_ms: u64,

    /// Extra delay after `duration_ms` before a new session may start (B)
    pub cooldown_buffer_ms: u64,

    /// Delay before the guard reopens after a failed creation.
    /// Defaults to `cooldown_buffer_ms`.
    pub creation_backoff_ms: Option<u64>,

    /// Media routing requested from the video platform
    pub media_mode: MediaMode,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_ms: 20_000,
            cooldown_buffer_ms: 10_000,
            creation_backoff_ms: None,
            media_mode: MediaMode::Routed,
        }
    }
}

impl SessionConfig {
    /// Delay from publish start to the close timer
    pub fn session_duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    /// Delay from publish start to the rearm timer
    pub fn rearm_delay(&self) -> Duration {
        Duration::from_millis(self.duration_ms.saturating_add(self.cooldown_buffer_ms))
    }

    pub fn cooldown_buffer(&self) -> Duration {
        Duration::from_millis(self.cooldown_buffer_ms)
    }

    pub fn creation_backoff(&self) -> Duration {
        Duration::from_millis(self.creation_backoff_ms.unwrap_or(self.cooldown_buffer_ms))
    }
}
