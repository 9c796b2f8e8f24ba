//! Actuator drivers, hardware initialisation, and peripheral helpers.

pub mod eyes;
pub mod hw_init;
pub mod mode_switch;
pub mod servo;
pub mod speaker;
pub mod watchdog;

use embedded_hal::delay::DelayNs;

/// Delay that returns immediately.  Host builds and tests use it so the
/// actuator ramps run at full speed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}
