use anyhow::{Context, Result};
use serde::Deserialize;

use crate::lifecycle::SessionConfig;
use crate::nats::NotifyConfig;
use crate::publish::PublishConfig;
use crate::sensor::GpioSensorConfig;
use crate::video::VideoConfig;

/// Prefix for environment overrides, e.g. `MOTION_CAM_VIDEO__API_SECRET`
const ENV_PREFIX: &str = "MOTION_CAM";

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    /// Public base URL viewers reach this device on
    pub public_url: String,
    #[serde(default)]
    pub sensor: GpioSensorConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub video: VideoConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub publish: PublishConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON file holding session records; `~` is expanded
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "~/.motion-cam/sessions.json".to_string(),
        }
    }
}

impl StoreConfig {
    pub fn expanded_path(&self) -> String {
        shellexpand::tilde(&self.path).into_owned()
    }
}

impl Config {
    /// Load `<path>.toml` (or any format `config` recognises), then apply
    /// `MOTION_CAM_*` environment overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path))?;

        Ok(settings.try_deserialize()?)
    }
}
