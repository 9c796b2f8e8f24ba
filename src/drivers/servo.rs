//! Neck servo driver (SG90-class hobby servo).
//!
//! 50 Hz frames on a 14-bit LEDC timer.  The neck creeps between pulse
//! positions in small steps; jumping straight to a target makes the head
//! snap and can strip the plastic gears.
//!
//! ```text
//!   BOTTOM 1070 µs ◀── MID 1560 µs ──▶ TOP 2200 µs
//! ```
//!
//! The bottom end sits further from centre than the top because the horn
//! is not mounted symmetrically on the bird's neck.

use embedded_hal::delay::DelayNs;

use crate::app::ports::{Neck, NeckPattern};
use crate::drivers::hw_init;
use crate::error::ActuatorError;
use crate::pins;

pub const PULSE_BOTTOM_US: u32 = 1070;
pub const PULSE_MID_US: u32 = 1560;
pub const PULSE_TOP_US: u32 = 2200;

const FRAME_US: u32 = 1_000_000 / pins::SERVO_PWM_FREQ_HZ;
const STEP_US: u32 = 15;
const STEP_MS: u32 = 20;
const END_PAUSE_MS: u32 = 1_300;
const GLANCE_PAUSE_MS: u32 = 600;

pub struct NeckServo<D> {
    delay: D,
    /// Last commanded pulse.  After a cold boot the horn is wherever it was
    /// at power-off, so the first move starts from the midpoint.
    pulse_us: u32,
}

impl<D: DelayNs> NeckServo<D> {
    pub fn new(delay: D) -> Self {
        Self {
            delay,
            pulse_us: PULSE_MID_US,
        }
    }

    pub fn position_us(&self) -> u32 {
        self.pulse_us
    }

    fn write(&mut self, pulse_us: u32) -> Result<(), ActuatorError> {
        if !hw_init::ledc_set(hw_init::LEDC_CH_SERVO, pulse_to_duty(pulse_us)) {
            return Err(ActuatorError::PwmWriteFailed);
        }
        self.pulse_us = pulse_us;
        Ok(())
    }

    fn move_to(&mut self, target_us: u32) -> Result<(), ActuatorError> {
        let target_us = target_us.clamp(PULSE_BOTTOM_US, PULSE_TOP_US);
        while self.pulse_us != target_us {
            let next = if self.pulse_us < target_us {
                (self.pulse_us + STEP_US).min(target_us)
            } else {
                self.pulse_us.saturating_sub(STEP_US).max(target_us)
            };
            self.write(next)?;
            self.delay.delay_ms(STEP_MS);
        }
        Ok(())
    }

    /// Top, bottom, then back to centre.
    fn sweep(&mut self) -> Result<(), ActuatorError> {
        self.write(PULSE_MID_US)?;
        self.move_to(PULSE_TOP_US)?;
        self.delay.delay_ms(END_PAUSE_MS);
        self.move_to(PULSE_BOTTOM_US)?;
        self.delay.delay_ms(END_PAUSE_MS);
        self.move_to(PULSE_MID_US)
    }

    /// A short look to one side and back.
    fn glance(&mut self) -> Result<(), ActuatorError> {
        self.write(PULSE_MID_US)?;
        self.move_to((PULSE_MID_US + PULSE_TOP_US) / 2)?;
        self.delay.delay_ms(GLANCE_PAUSE_MS);
        self.move_to(PULSE_MID_US)
    }
}

impl<D: DelayNs> Neck for NeckServo<D> {
    fn rotate(&mut self, pattern: NeckPattern) -> Result<(), ActuatorError> {
        match pattern {
            NeckPattern::Sweep => self.sweep(),
            NeckPattern::Glance => self.glance(),
        }
    }
}

/// Pulse width to 14-bit LEDC duty.
fn pulse_to_duty(pulse_us: u32) -> u32 {
    pulse_us * (1 << pins::SERVO_RESOLUTION_BITS) / FRAME_US
}
