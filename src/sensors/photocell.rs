//! Photocell light sensor.
//!
//! A light-dependent resistor in a divider with a fixed 10 kOhm resistor,
//! read via the ESP32-S3 ADC.  Brighter light gives a higher reading.
//! Each wake cycle takes one short burst of samples and averages it into
//! a single value; nothing is kept between cycles.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads ADC1_CH4 via the oneshot API (initialised by hw_init).
//! On host/test: reads from a static `AtomicU16` for injection.

use core::sync::atomic::{AtomicBool, AtomicU16, Ordering};

use crate::config::LIGHT_ADC_MAX;
use crate::error::SensorError;

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;

static SIM_LIGHT_ADC: AtomicU16 = AtomicU16::new(2048);
static SIM_LIGHT_FAIL: AtomicBool = AtomicBool::new(false);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_light_adc(raw: u16) {
    SIM_LIGHT_ADC.store(raw, Ordering::Relaxed);
}

/// Make every simulated conversion fail (or succeed again).
#[cfg(not(target_os = "espidf"))]
pub fn sim_fail_light(fail: bool) {
    SIM_LIGHT_FAIL.store(fail, Ordering::Relaxed);
}

/// Samples averaged into one reading.
pub const BURST_SAMPLES: usize = 5;

pub struct Photocell {
    _adc_gpio: i32,
}

impl Photocell {
    pub fn new(adc_gpio: i32) -> Self {
        Self {
            _adc_gpio: adc_gpio,
        }
    }

    /// Averaged light level.  A single failed conversion fails the read.
    pub fn read(&mut self) -> Result<u16, SensorError> {
        let mut samples = [0u16; BURST_SAMPLES];
        for slot in &mut samples {
            *slot = self.read_adc().ok_or(SensorError::AdcReadFailed)?;
        }
        average(&samples)
    }

    #[cfg(target_os = "espidf")]
    fn read_adc(&self) -> Option<u16> {
        hw_init::adc1_read(hw_init::ADC1_CH_LIGHT)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_adc(&self) -> Option<u16> {
        if SIM_LIGHT_FAIL.load(Ordering::Relaxed) {
            return None;
        }
        Some(SIM_LIGHT_ADC.load(Ordering::Relaxed))
    }
}

fn average(samples: &[u16]) -> Result<u16, SensorError> {
    if samples.is_empty() {
        return Err(SensorError::NotPresent);
    }
    if samples.iter().any(|&s| s > LIGHT_ADC_MAX) {
        return Err(SensorError::OutOfRange);
    }
    let sum: u32 = samples.iter().map(|&s| u32::from(s)).sum();
    Ok((sum / samples.len() as u32) as u16)
}
