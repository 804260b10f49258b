//! One-way text notifications carrying the viewing link
//!
//! Delivery is at-most-once. The controller never retries and never waits on
//! the outcome before continuing the lifecycle.

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// A text message for the configured recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub link: String,
    pub body: String,
}

impl Notification {
    /// The "motion detected" message for a public base URL
    pub fn motion_detected(public_url: &str) -> Self {
        let link = viewing_link(public_url);
        let body = format!(
            "Motion has been detected on your camera, please view the link here: {}",
            link
        );
        Self { link, body }
    }
}

/// Acknowledgement returned by the messaging gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageReceipt {
    pub message_uuid: String,
}

/// Link viewers open to watch the live session
pub fn viewing_link(public_url: &str) -> String {
    format!("{}/client", public_url.trim_end_matches('/'))
}

#[async_trait::async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<MessageReceipt>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewing_link_from_trailing_slash() {
        assert_eq!(viewing_link("https://h.example/"), "https://h.example/client");
    }

    #[test]
    fn test_viewing_link_without_trailing_slash() {
        assert_eq!(viewing_link("https://h.example"), "https://h.example/client");
    }

    #[test]
    fn test_motion_message_body() {
        let notification = Notification::motion_detected("https://h.example/");
        assert_eq!(notification.link, "https://h.example/client");
        assert_eq!(
            notification.body,
            "Motion has been detected on your camera, please view the link here: https://h.example/client"
        );
    }
}
