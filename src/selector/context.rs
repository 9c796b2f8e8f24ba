//! Context threaded through every selector handler.
//!
//! `SelectorContext` holds the cycle's inputs (read-only to handlers), the
//! configuration, the injected random source, and the single output slot
//! that the settling state writes its [`Decision`] into.

use chrono::NaiveTime;
use rand::RngCore;

use super::Decision;
use crate::config::{BirdConfig, Mode};

/// Everything the selector looks at besides the configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectorInput {
    /// Local time of day at the top of the cycle.
    pub now: NaiveTime,
    /// Light gate result for this cycle.
    pub light_sufficient: bool,
    /// Effective mode (switch position, else configured mode).
    pub mode: Mode,
    /// Clips the speaker offers.
    pub clip_count: u8,
    /// Battery is below the configured critical level.
    pub battery_critical: bool,
}

/// The context passed to every state handler function.
pub struct SelectorContext<'a> {
    pub input: SelectorInput,
    pub config: &'a BirdConfig,
    pub rng: &'a mut dyn RngCore,
    /// Written by the state the machine settles in.
    pub decision: Option<Decision>,
}

impl<'a> SelectorContext<'a> {
    pub fn new(input: SelectorInput, config: &'a BirdConfig, rng: &'a mut dyn RngCore) -> Self {
        Self {
            input,
            config,
            rng,
            decision: None,
        }
    }

    /// Whether the cycle's time falls inside the configured window.
    pub fn in_window(&self) -> bool {
        self.config.window().contains(self.input.now)
    }
}
