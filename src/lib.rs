pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod nats;
pub mod notify;
pub mod publish;
pub mod sensor;
pub mod store;
pub mod video;

pub use config::Config;
pub use error::SessionFault;
pub use http::{create_router, AppState};
pub use lifecycle::{
    Collaborators, LifecycleState, LifecycleStatus, SessionConfig, SessionController, SessionGuard,
};
pub use nats::NatsNotifier;
pub use notify::{MessageReceipt, Notification, NotificationDispatcher};
pub use publish::{BrowserPublishAgent, PublishAgent, PublishHandle};
pub use sensor::{MotionSensor, SensorEvent, SysfsGpioSensor};
pub use store::{JsonFileSessionStore, MemorySessionStore, SessionRecord, SessionStore};
pub use video::{MediaMode, OpenTokClient, VideoPlatform};
