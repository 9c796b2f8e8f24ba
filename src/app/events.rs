//! Outbound application events.
//!
//! The [`BirdService`](super::service::BirdService) and the sequencer emit
//! these through the [`EventSink`](super::ports::EventSink) port.  Adapters
//! on the other side decide what to do with them; on the device they go to
//! the serial log.

use chrono::NaiveDateTime;

use crate::app::ports::{SensorReading, WakeCause};
use crate::config::Mode;
use crate::error::{ActuatorError, AlarmError};
use crate::selector::Decision;
use crate::sequencer::Step;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// A wake cycle began.
    CycleStarted { cause: WakeCause, boot_count: u32 },

    /// The mode switch disagrees with the stored mode for this cycle.
    ModeOverridden { configured: Mode, switch: Mode },

    /// The cycle's sensor snapshot.
    Sensed(SensorReading),

    /// The selector's verdict.
    Decided(Decision),

    /// One actuator step failed; the sequence carried on.
    StepFailed { step: Step, error: ActuatorError },

    /// The wake alarm is armed and the chip is about to sleep.
    SleepArmed { wake_at: NaiveDateTime, after_secs: u64 },

    /// Arming for the computed instant failed; the fallback duration is used.
    AlarmFallback(AlarmError),
}
