pub mod client;
pub mod messages;

pub use client::{NatsNotifier, NotifyConfig};
pub use messages::{Endpoint, SmsReply, SmsRequest};
