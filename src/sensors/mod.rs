//! Sensor subsystem — individual drivers and the aggregating [`SensorHub`].
//!
//! The hub owns every sensor driver and produces the cycle's
//! [`SensorReading`] through the [`SensorPort`] methods.

pub mod battery;
pub mod photocell;
pub mod temperature;

use crate::app::ports::SensorReading;
use crate::error::SensorError;
use battery::BatteryMonitor;
use photocell::Photocell;
use temperature::TemperatureSensor;

/// Aggregates all sensor drivers.
pub struct SensorHub {
    pub light: Photocell,
    pub battery: BatteryMonitor,
    pub temperature: TemperatureSensor,
}

impl SensorHub {
    /// Construct a new hub.  Pass in pre-built drivers (built in main
    /// where peripheral ownership is established).
    pub fn new(light: Photocell, battery: BatteryMonitor, temperature: TemperatureSensor) -> Self {
        Self {
            light,
            battery,
            temperature,
        }
    }

    pub fn read_light(&mut self) -> Result<u16, SensorError> {
        self.light.read()
    }

    pub fn read_battery_mv(&mut self) -> Option<u16> {
        self.battery.read_mv()
    }

    pub fn read_temperature(&mut self) -> Option<f32> {
        self.temperature.read_celsius()
    }

    /// Read every sensor once.
    pub fn read_all(&mut self, timestamp_ms: u64) -> SensorReading {
        SensorReading {
            light: self.read_light(),
            temperature_c: self.read_temperature(),
            battery_mv: self.read_battery_mv(),
            timestamp_ms,
        }
    }
}
