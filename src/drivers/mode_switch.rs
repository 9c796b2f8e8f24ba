//! Mode slide switch.
//!
//! Read once at the top of each wake cycle; no debouncing.  Birds built
//! without a switch pass `None` and always use the stored mode.

use crate::app::ports::ModeSwitch;
use crate::config::Mode;
use crate::drivers::hw_init;

pub struct ModeSwitchDriver {
    gpio: Option<i32>,
}

impl ModeSwitchDriver {
    pub fn new(gpio: Option<i32>) -> Self {
        Self { gpio }
    }
}

impl ModeSwitch for ModeSwitchDriver {
    fn read_mode(&mut self) -> Option<Mode> {
        let pin = self.gpio?;
        // pulled up: HIGH = Clock, LOW = Random
        Some(if hw_init::gpio_read(pin) {
            Mode::Clock
        } else {
            Mode::Random
        })
    }
}
