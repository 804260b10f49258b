pub mod agent;
pub mod browser;

pub use agent::{PublishAgent, PublishHandle};
pub use browser::{BrowserPublishAgent, PublishConfig};
