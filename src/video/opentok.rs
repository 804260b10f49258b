// Video platform client for the OpenTok / Vonage Video REST API

use anyhow::{bail, Context, Result};
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use super::platform::{MediaMode, VideoPlatform};

/// Lifetime of the JWT that authenticates REST calls
const PROJECT_JWT_TTL_SECS: u64 = 180;

/// Configuration for the video platform client
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// REST API base URL
    pub api_base_url: String,
    /// Project API key (public, handed to viewers)
    pub api_key: String,
    /// Project API secret (signs every JWT)
    pub api_secret: String,
    /// Lifetime of viewer tokens
    pub token_ttl_secs: u64,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.opentok.com".to_string(),
            api_key: String::new(),
            api_secret: String::new(),
            token_ttl_secs: 86_400, // 1 day
        }
    }
}

/// OpenTok REST client
pub struct OpenTokClient {
    config: VideoConfig,
    http_client: reqwest::Client,
}

impl OpenTokClient {
    pub fn new(config: VideoConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            bail!("video.api_key must not be empty");
        }
        if config.api_secret.trim().is_empty() {
            bail!("video.api_secret must not be empty");
        }

        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;

        info!("Video platform client ready ({})", config.api_base_url);

        Ok(Self {
            config,
            http_client,
        })
    }

    fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(self.config.api_secret.as_bytes())
    }

    /// JWT for the `X-OPENTOK-AUTH` header
    fn project_jwt(&self, now: u64) -> Result<String> {
        #[derive(Debug, Serialize)]
        struct Claims<'a> {
            iss: &'a str,
            ist: &'static str,
            iat: u64,
            exp: u64,
            jti: String,
        }

        let claims = Claims {
            iss: &self.config.api_key,
            ist: "project",
            iat: now,
            exp: now + PROJECT_JWT_TTL_SECS,
            jti: Uuid::new_v4().to_string(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key())
            .context("Failed to sign project JWT")
    }
}

fn unix_now() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

#[async_trait::async_trait]
impl VideoPlatform for OpenTokClient {
    async fn create_session(&self, mode: MediaMode) -> Result<String> {
        #[derive(Debug, Deserialize)]
        struct CreatedSession {
            session_id: String,
        }

        let jwt = self.project_jwt(unix_now())?;
        let endpoint = format!(
            "{}/session/create",
            self.config.api_base_url.trim_end_matches('/')
        );

        let response = self
            .http_client
            .post(endpoint)
            .header("Accept", "application/json")
            .header("X-OPENTOK-AUTH", jwt)
            .form(&[("p2p.preference", mode.p2p_preference())])
            .send()
            .await
            .context("Session create request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read response body".to_string());
            bail!("Session create returned HTTP {}: {}", status.as_u16(), body);
        }

        let sessions: Vec<CreatedSession> = response
            .json()
            .await
            .context("Failed to parse session create response")?;

        let session = sessions
            .into_iter()
            .next()
            .context("Session create response was empty")?;

        info!("Video session created: {}", session.session_id);

        Ok(session.session_id)
    }

    fn generate_token(&self, session_id: &str) -> Result<String> {
        #[derive(Debug, Serialize)]
        struct Claims<'a> {
            iss: &'a str,
            ist: &'static str,
            iat: u64,
            exp: u64,
            jti: String,
            scope: &'static str,
            session_id: &'a str,
            role: &'static str,
        }

        let now = unix_now();
        let claims = Claims {
            iss: &self.config.api_key,
            ist: "project",
            iat: now,
            exp: now + self.config.token_ttl_secs,
            jti: Uuid::new_v4().to_string(),
            scope: "session.connect",
            session_id,
            role: "publisher",
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key())
            .context("Failed to sign viewer token")
    }

    fn api_key(&self) -> &str {
        &self.config.api_key
    }
}
