//! Battery voltage monitor.
//!
//! The cell is tapped through a 2:1 resistive divider into an ADC channel.
//! Mains-powered birds have no divider fitted and report no voltage.

use core::sync::atomic::{AtomicU16, Ordering};

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;

static SIM_BATTERY_ADC: AtomicU16 = AtomicU16::new(2600);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_battery_adc(raw: u16) {
    SIM_BATTERY_ADC.store(raw, Ordering::Relaxed);
}

const ADC_MAX: u32 = 4095;
const V_REF_MV: u32 = 3300;
const DIVIDER_RATIO: u32 = 2;

pub struct BatteryMonitor {
    fitted: bool,
}

impl BatteryMonitor {
    pub fn new(fitted: bool) -> Self {
        Self { fitted }
    }

    /// Cell voltage in millivolts, `None` without a battery or on an ADC error.
    pub fn read_mv(&mut self) -> Option<u16> {
        if !self.fitted {
            return None;
        }
        self.read_adc().map(adc_to_mv)
    }

    #[cfg(target_os = "espidf")]
    fn read_adc(&self) -> Option<u16> {
        hw_init::adc1_read(hw_init::ADC1_CH_BATTERY)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_adc(&self) -> Option<u16> {
        Some(SIM_BATTERY_ADC.load(Ordering::Relaxed))
    }
}

fn adc_to_mv(raw: u16) -> u16 {
    let at_pin = u32::from(raw).min(ADC_MAX) * V_REF_MV / ADC_MAX;
    (at_pin * DIVIDER_RATIO) as u16
}
