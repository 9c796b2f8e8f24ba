//! LED eye driver.
//!
//! Both eyes share one LEDC channel (8-bit).  Brightness ramps follow a
//! square law so the fade looks linear to the eye.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: writes LEDC duty via hw_init.
//! On host/test: the hw_init stubs accept every write.

use embedded_hal::delay::DelayNs;

use crate::app::ports::Eyes;
use crate::drivers::hw_init;
use crate::error::ActuatorError;

const FADE_STEP: u16 = 5;
const FADE_STEP_MS: u32 = 5;
const MAX_LEVEL: u16 = 255;

pub struct EyesDriver<D> {
    delay: D,
    level: u8,
}

impl<D: DelayNs> EyesDriver<D> {
    pub fn new(delay: D) -> Self {
        Self { delay, level: 0 }
    }

    /// Current perceptual brightness (0 = dark).
    pub fn level(&self) -> u8 {
        self.level
    }

    fn write(&mut self, level: u16) -> Result<(), ActuatorError> {
        if !hw_init::ledc_set(hw_init::LEDC_CH_EYES, gamma(level)) {
            return Err(ActuatorError::PwmWriteFailed);
        }
        self.level = level.min(MAX_LEVEL) as u8;
        Ok(())
    }

    fn fade_in(&mut self) -> Result<(), ActuatorError> {
        for level in (u16::from(self.level)..=MAX_LEVEL).step_by(FADE_STEP as usize) {
            self.write(level)?;
            self.delay.delay_ms(FADE_STEP_MS);
        }
        self.write(MAX_LEVEL)
    }

    fn fade_out(&mut self) -> Result<(), ActuatorError> {
        for level in (0..=u16::from(self.level)).rev().step_by(FADE_STEP as usize) {
            self.write(level)?;
            self.delay.delay_ms(FADE_STEP_MS);
        }
        self.write(0)
    }
}

impl<D: DelayNs> Eyes for EyesDriver<D> {
    fn on(&mut self) -> Result<(), ActuatorError> {
        self.fade_in()
    }

    fn off(&mut self) -> Result<(), ActuatorError> {
        if self.level == 0 {
            return self.write(0);
        }
        self.fade_out()
    }

    fn flash(&mut self, count: u8) -> Result<(), ActuatorError> {
        for _ in 0..count {
            self.fade_in()?;
            self.fade_out()?;
        }
        Ok(())
    }
}

/// Perceptual level to 8-bit duty.
fn gamma(level: u16) -> u32 {
    let level = u32::from(level.min(MAX_LEVEL));
    level * level / u32::from(MAX_LEVEL)
}
