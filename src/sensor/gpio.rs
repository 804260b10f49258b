// Linux sysfs GPIO motion sensor (PIR output wired to a digital input pin)

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use super::source::{MotionSensor, SensorEvent};

/// Attempts to wait for the kernel to create `gpio<N>/` after an export
const EXPORT_SETTLE_ATTEMPTS: u32 = 20;
const EXPORT_SETTLE_INTERVAL: Duration = Duration::from_millis(10);

/// Configuration for the GPIO sensor
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GpioSensorConfig {
    /// BCM pin number the sensor is wired to
    pub gpio_pin: u32,
    /// Root of the sysfs GPIO tree
    pub sysfs_root: PathBuf,
    /// How often the value file is sampled
    pub poll_interval_ms: u64,
}

impl Default for GpioSensorConfig {
    fn default() -> Self {
        Self {
            gpio_pin: 18,
            sysfs_root: PathBuf::from("/sys/class/gpio"),
            poll_interval_ms: 50,
        }
    }
}

/// Motion sensor backed by a sysfs GPIO value file
pub struct SysfsGpioSensor {
    config: GpioSensorConfig,
    poll_task: Option<JoinHandle<()>>,
    /// Set by `stop`; the stream is not restartable
    stopped: bool,
}

impl SysfsGpioSensor {
    pub fn new(config: GpioSensorConfig) -> Self {
        info!(
            "GPIO sensor configured: pin {} under {} ({}ms poll)",
            config.gpio_pin,
            config.sysfs_root.display(),
            config.poll_interval_ms
        );

        Self {
            config,
            poll_task: None,
            stopped: false,
        }
    }

    fn pin_dir(&self) -> PathBuf {
        self.config
            .sysfs_root
            .join(format!("gpio{}", self.config.gpio_pin))
    }

    /// Export the pin if needed and configure it as an input
    async fn prepare_pin(&self) -> Result<PathBuf> {
        let pin_dir = self.pin_dir();

        if !pin_dir.exists() {
            info!("Exporting GPIO pin {}", self.config.gpio_pin);
            tokio::fs::write(
                self.config.sysfs_root.join("export"),
                self.config.gpio_pin.to_string(),
            )
            .await
            .context("Failed to export GPIO pin")?;

            let mut attempts = 0;
            while !pin_dir.exists() {
                attempts += 1;
                if attempts > EXPORT_SETTLE_ATTEMPTS {
                    bail!("{} did not appear after export", pin_dir.display());
                }
                tokio::time::sleep(EXPORT_SETTLE_INTERVAL).await;
            }
        }

        tokio::fs::write(pin_dir.join("direction"), "in")
            .await
            .context("Failed to set GPIO direction")?;

        Ok(pin_dir.join("value"))
    }
}

#[async_trait::async_trait]
impl MotionSensor for SysfsGpioSensor {
    async fn start(&mut self) -> Result<mpsc::Receiver<SensorEvent>> {
        if self.stopped {
            bail!("Sensor was stopped and cannot be restarted");
        }
        if self.poll_task.is_some() {
            bail!("Already watching");
        }

        let value_path = self.prepare_pin().await?;
        let poll_interval = Duration::from_millis(self.config.poll_interval_ms.max(1));

        // Capacity 1: a consumer that is not listening misses edges
        let (tx, rx) = mpsc::channel(1);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            let mut last_level: Option<u8> = None;
            let mut faulted = false;

            loop {
                ticker.tick().await;

                let event = match read_level(&value_path).await {
                    Ok(level) => {
                        faulted = false;
                        let event = edge(last_level, level);
                        last_level = Some(level);
                        event
                    }
                    Err(e) if !faulted => {
                        faulted = true;
                        error!("GPIO read failed: {:#}", e);
                        Some(SensorEvent::Fault(format!("{:#}", e)))
                    }
                    Err(_) => None,
                };

                let Some(event) = event else { continue };

                match tx.try_send(event) {
                    Ok(()) => {}
                    Err(TrySendError::Full(event)) => {
                        debug!("Consumer busy, dropping sensor event {:?}", event);
                    }
                    Err(TrySendError::Closed(_)) => break,
                }
            }

            info!("GPIO poll task stopped");
        });

        self.poll_task = Some(task);

        info!("Watching GPIO pin {}", self.config.gpio_pin);

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        self.stopped = true;
        if let Some(task) = self.poll_task.take() {
            info!("Stopping GPIO sensor");
            task.abort();
        }
        Ok(())
    }

    fn is_watching(&self) -> bool {
        self.poll_task.is_some()
    }

    fn name(&self) -> &str {
        "sysfs GPIO"
    }
}

/// Edge produced by moving from `previous` to `level`.
///
/// The first sample only reports motion that is already present.
fn edge(previous: Option<u8>, level: u8) -> Option<SensorEvent> {
    match previous {
        Some(prev) if prev == level => None,
        None if level == 0 => None,
        _ => Some(SensorEvent::from_level(level)),
    }
}

async fn read_level(path: &Path) -> Result<u8> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    match raw.trim() {
        "0" => Ok(0),
        "1" => Ok(1),
        other => bail!("Unexpected GPIO value {:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_detection() {
        assert_eq!(edge(None, 0), None);
        assert_eq!(edge(None, 1), Some(SensorEvent::Rising));
        assert_eq!(edge(Some(0), 1), Some(SensorEvent::Rising));
        assert_eq!(edge(Some(1), 0), Some(SensorEvent::Falling));
        assert_eq!(edge(Some(1), 1), None);
        assert_eq!(edge(Some(0), 0), None);
    }

    #[test]
    fn test_default_config() {
        let config = GpioSensorConfig::default();
        assert_eq!(config.gpio_pin, 18);
        assert_eq!(config.sysfs_root, PathBuf::from("/sys/class/gpio"));
        assert_eq!(config.poll_interval_ms, 50);
    }
}
