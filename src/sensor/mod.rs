pub mod gpio;
pub mod source;

pub use gpio::{GpioSensorConfig, SysfsGpioSensor};
pub use source::{MotionSensor, SensorEvent};
