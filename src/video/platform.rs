use anyhow::Result;
use serde::{Deserialize, Serialize};

/// How media flows through the video platform
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaMode {
    /// Media goes through the platform's media router
    #[default]
    Routed,
    /// Clients attempt peer-to-peer media
    Relayed,
}

impl MediaMode {
    /// Value of the `p2p.preference` field on session creation
    pub fn p2p_preference(self) -> &'static str {
        match self {
            MediaMode::Routed => "disabled",
            MediaMode::Relayed => "enabled",
        }
    }
}

/// Remote video platform that hosts publish sessions
#[async_trait::async_trait]
pub trait VideoPlatform: Send + Sync {
    /// Ask the platform for a new session, returning its identifier
    async fn create_session(&self, mode: MediaMode) -> Result<String>;

    /// Mint a viewer token for an existing session
    fn generate_token(&self, session_id: &str) -> Result<String>;

    /// Public API key handed to viewers alongside a token
    fn api_key(&self) -> &str;
}
