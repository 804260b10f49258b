use anyhow::{bail, Context, Result};
use async_nats::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::info;

use super::messages::{SmsReply, SmsRequest};
use crate::notify::{MessageReceipt, Notification, NotificationDispatcher};

/// Configuration for SMS delivery through a NATS gateway
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub nats_url: String,
    /// Subject the SMS gateway answers requests on
    pub subject: String,
    /// Phone number that receives alerts
    pub recipient: String,
    /// Sender id or brand name shown to the recipient
    pub sender: String,
    pub request_timeout_ms: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            nats_url: "nats://localhost:4222".to_string(),
            subject: "sms.send".to_string(),
            recipient: String::new(),
            sender: "MotionCam".to_string(),
            request_timeout_ms: 5_000,
        }
    }
}

/// Sends notifications as SMS send requests over NATS request/reply
pub struct NatsNotifier {
    client: Client,
    config: NotifyConfig,
}

impl NatsNotifier {
    /// Connect to NATS server
    pub async fn connect(config: NotifyConfig) -> Result<Self> {
        info!("Connecting to NATS at {}", config.nats_url);

        let client = async_nats::connect(&config.nats_url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self { client, config })
    }
}

#[async_trait::async_trait]
impl NotificationDispatcher for NatsNotifier {
    async fn send(&self, notification: &Notification) -> Result<MessageReceipt> {
        let request = SmsRequest::text(
            &self.config.recipient,
            &self.config.sender,
            notification.body.clone(),
        );
        let payload = serde_json::to_vec(&request)?;

        let timeout = Duration::from_millis(self.config.request_timeout_ms);
        let reply = tokio::time::timeout(
            timeout,
            self.client
                .request(self.config.subject.clone(), payload.into()),
        )
        .await
        .context("SMS gateway did not answer in time")?
        .context("Failed to send SMS request")?;

        let receipt = parse_reply(&reply.payload)?;

        info!(
            "Message {} sent to {} via {}",
            receipt.message_uuid, self.config.recipient, self.config.subject
        );

        Ok(receipt)
    }
}

fn parse_reply(payload: &[u8]) -> Result<MessageReceipt> {
    let reply: SmsReply =
        serde_json::from_slice(payload).context("Failed to parse SMS gateway reply")?;

    if let Some(error) = reply.error {
        bail!("SMS gateway rejected message: {}", error);
    }

    match reply.message_uuid {
        Some(message_uuid) => Ok(MessageReceipt { message_uuid }),
        None => bail!("SMS gateway reply carried no message id"),
    }
}
