use thiserror::Error;

/// Faults raised by the external collaborators of a session, as seen by the
/// lifecycle controller.
///
/// None of these are fatal. The controller logs them, decides the next
/// transition, and keeps running.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionFault {
    /// The motion sensor could not be read
    #[error("sensor read failed: {0}")]
    SensorRead(String),

    /// The video platform rejected or failed the session creation call
    #[error("session creation failed: {0}")]
    SessionCreation(String),

    /// Capture could not begin
    #[error("publish start failed: {0}")]
    PublishStart(String),

    /// Stopping or releasing the publish agent failed
    #[error("publish teardown failed: {0}")]
    PublishTeardown(String),

    /// The viewing link could not be delivered
    #[error("notification failed: {0}")]
    Notification(String),

    /// A session record write did not reach the store
    #[error("persistence failed: {0}")]
    Persistence(String),
}

impl SessionFault {
    pub fn creation(err: anyhow::Error) -> Self {
        Self::SessionCreation(format!("{:#}", err))
    }

    pub fn publish_start(err: anyhow::Error) -> Self {
        Self::PublishStart(format!("{:#}", err))
    }

    pub fn teardown(err: anyhow::Error) -> Self {
        Self::PublishTeardown(format!("{:#}", err))
    }

    pub fn notification(err: anyhow::Error) -> Self {
        Self::Notification(format!("{:#}", err))
    }

    pub fn persistence(err: anyhow::Error) -> Self {
        Self::Persistence(format!("{:#}", err))
    }
}
