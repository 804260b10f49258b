pub mod opentok;
pub mod platform;

pub use opentok::{OpenTokClient, VideoConfig};
pub use platform::{MediaMode, VideoPlatform};
