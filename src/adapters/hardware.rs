//! Hardware adapter — bridges real peripherals to domain port traits.
//!
//! Owns the [`SensorHub`] and all actuator drivers, exposing them through
//! the sensor, actuator and mode-switch ports.  This is the only module in
//! the system that touches actual hardware.  On non-espidf targets, the
//! underlying drivers use cfg-gated simulation stubs.

use embedded_hal::delay::DelayNs;

use crate::app::ports::{ClipId, Eyes, ModeSwitch, Neck, NeckPattern, SensorPort, Speaker};
use crate::config::Mode;
use crate::drivers::eyes::EyesDriver;
use crate::drivers::mode_switch::ModeSwitchDriver;
use crate::drivers::servo::NeckServo;
use crate::drivers::speaker::SpeakerDriver;
use crate::error::{ActuatorError, SensorError};
use crate::sensors::SensorHub;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<D> {
    sensor_hub: SensorHub,
    eyes: EyesDriver<D>,
    neck: NeckServo<D>,
    speaker: SpeakerDriver<D>,
    mode_switch: ModeSwitchDriver,
}

impl<D: DelayNs + Clone> HardwareAdapter<D> {
    /// Build every actuator driver around its own copy of `delay`.
    pub fn new(sensor_hub: SensorHub, mode_switch: ModeSwitchDriver, delay: D) -> Self {
        Self {
            sensor_hub,
            eyes: EyesDriver::new(delay.clone()),
            neck: NeckServo::new(delay.clone()),
            speaker: SpeakerDriver::new(delay),
            mode_switch,
        }
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<D: DelayNs> SensorPort for HardwareAdapter<D> {
    fn read_light(&mut self) -> Result<u16, SensorError> {
        self.sensor_hub.read_light()
    }

    fn read_temperature(&mut self) -> Option<f32> {
        self.sensor_hub.read_temperature()
    }

    fn read_battery_mv(&mut self) -> Option<u16> {
        self.sensor_hub.read_battery_mv()
    }
}

// ── Actuator ports ────────────────────────────────────────────

impl<D: DelayNs> Eyes for HardwareAdapter<D> {
    fn on(&mut self) -> Result<(), ActuatorError> {
        self.eyes.on()
    }

    fn off(&mut self) -> Result<(), ActuatorError> {
        self.eyes.off()
    }

    fn flash(&mut self, count: u8) -> Result<(), ActuatorError> {
        self.eyes.flash(count)
    }
}

impl<D: DelayNs> Neck for HardwareAdapter<D> {
    fn rotate(&mut self, pattern: NeckPattern) -> Result<(), ActuatorError> {
        self.neck.rotate(pattern)
    }
}

impl<D: DelayNs> Speaker for HardwareAdapter<D> {
    fn play(&mut self, clip: ClipId, volume: f32) -> Result<(), ActuatorError> {
        self.speaker.play(clip, volume)
    }

    fn clip_count(&self) -> u8 {
        self.speaker.clip_count()
    }
}

impl<D: DelayNs> ModeSwitch for HardwareAdapter<D> {
    fn read_mode(&mut self) -> Option<Mode> {
        self.mode_switch.read_mode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::NoDelay;
    use crate::sensors::battery::BatteryMonitor;
    use crate::sensors::photocell::Photocell;
    use crate::sensors::temperature::TemperatureSensor;
    use crate::pins;

    fn adapter() -> HardwareAdapter<NoDelay> {
        let hub = SensorHub::new(
            Photocell::new(pins::LIGHT_ADC_GPIO),
            BatteryMonitor::new(false),
            TemperatureSensor::new(),
        );
        HardwareAdapter::new(hub, ModeSwitchDriver::new(None), NoDelay)
    }

    #[test]
    fn simulated_bird_runs_every_actuator() {
        let mut hw = adapter();
        assert_eq!(hw.on(), Ok(()));
        assert_eq!(hw.rotate(NeckPattern::Sweep), Ok(()));
        assert_eq!(hw.play(ClipId::CAW, 0.5), Ok(()));
        assert_eq!(hw.off(), Ok(()));
        assert_eq!(hw.flash(2), Ok(()));
    }

    #[test]
    fn mains_bird_without_switch() {
        let mut hw = adapter();
        assert_eq!(hw.read_battery_mv(), None);
        assert_eq!(hw.read_mode(), None);
        assert!(hw.clip_count() > 0);
    }
}
