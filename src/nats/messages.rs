use serde::{Deserialize, Serialize};

/// Addressing for one side of a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    #[serde(rename = "type")]
    pub channel: String,  // Always "sms" here
    pub number: String,
}

impl Endpoint {
    pub fn sms(number: impl Into<String>) -> Self {
        Self {
            channel: "sms".to_string(),
            number: number.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageContent {
    #[serde(rename = "type")]
    pub content_type: String,  // Always "text" here
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBody {
    pub content: MessageContent,
}

/// Send request published to the SMS gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsRequest {
    pub to: Endpoint,
    pub from: Endpoint,
    pub message: MessageBody,
}

impl SmsRequest {
    pub fn text(to: &str, from: &str, text: impl Into<String>) -> Self {
        Self {
            to: Endpoint::sms(to),
            from: Endpoint::sms(from),
            message: MessageBody {
                content: MessageContent {
                    content_type: "text".to_string(),
                    text: text.into(),
                },
            },
        }
    }
}

/// Gateway reply: either an accepted message id or an error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsReply {
    pub message_uuid: Option<String>,
    pub error: Option<String>,
}
