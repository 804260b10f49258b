use anyhow::Result;
use tokio::sync::mpsc;

/// Edge reported by the motion sensor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorEvent {
    /// Motion present (input went 0 -> 1)
    Rising,
    /// Motion absent (input went 1 -> 0)
    Falling,
    /// The underlying read failed; never treated as `Falling`
    Fault(String),
}

impl SensorEvent {
    /// Map a digital input level to the edge it represents
    pub fn from_level(level: u8) -> Self {
        if level == 1 {
            SensorEvent::Rising
        } else {
            SensorEvent::Falling
        }
    }
}

/// Motion sensor trait
///
/// Implementations:
/// - Sysfs GPIO: polls a Linux GPIO value file
///
/// The event stream is lazy, infinite and cannot be restarted once stopped.
/// Events are not buffered for consumers that fall behind.
#[async_trait::async_trait]
pub trait MotionSensor: Send + Sync {
    /// Start watching the sensor
    ///
    /// Returns a channel receiver that will receive edge events
    async fn start(&mut self) -> Result<mpsc::Receiver<SensorEvent>>;

    /// Stop watching the sensor
    async fn stop(&mut self) -> Result<()>;

    /// Check if the sensor is currently being watched
    fn is_watching(&self) -> bool;

    /// Get sensor name for logging
    fn name(&self) -> &str;
}
