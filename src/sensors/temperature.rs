//! On-die temperature sensor.
//!
//! The ESP32-S3 has an internal sensor good to a couple of degrees; the
//! reading only goes into the cycle log.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: the `temperature_sensor` driver, installed lazily on first read.
//! On host/test: a static `AtomicI32` in tenths of a degree, absent by default.

use core::sync::atomic::{AtomicI32, Ordering};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const SIM_ABSENT: i32 = i32::MIN;
static SIM_TEMP_DECI_C: AtomicI32 = AtomicI32::new(SIM_ABSENT);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_temperature(celsius: Option<f32>) {
    let raw = celsius.map_or(SIM_ABSENT, |c| (c * 10.0).round() as i32);
    SIM_TEMP_DECI_C.store(raw, Ordering::Relaxed);
}

pub struct TemperatureSensor {
    #[cfg(target_os = "espidf")]
    handle: temperature_sensor_handle_t,
}

impl Default for TemperatureSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl TemperatureSensor {
    pub fn new() -> Self {
        Self {
            #[cfg(target_os = "espidf")]
            handle: core::ptr::null_mut(),
        }
    }

    #[cfg(target_os = "espidf")]
    pub fn read_celsius(&mut self) -> Option<f32> {
        if self.handle.is_null() {
            let cfg = temperature_sensor_config_t {
                range_min: -10,
                range_max: 80,
                ..Default::default()
            };
            // SAFETY: handle is owned by this driver and installed once.
            let ret = unsafe { temperature_sensor_install(&cfg, &mut self.handle) };
            if ret != ESP_OK as i32 {
                log::warn!("temperature: install failed ({})", ret);
                self.handle = core::ptr::null_mut();
                return None;
            }
            if unsafe { temperature_sensor_enable(self.handle) } != ESP_OK as i32 {
                return None;
            }
        }
        let mut celsius = 0.0_f32;
        let ret = unsafe { temperature_sensor_get_celsius(self.handle, &mut celsius) };
        (ret == ESP_OK as i32).then_some(celsius)
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn read_celsius(&mut self) -> Option<f32> {
        match SIM_TEMP_DECI_C.load(Ordering::Relaxed) {
            SIM_ABSENT => None,
            deci => Some(deci as f32 / 10.0),
        }
    }
}
