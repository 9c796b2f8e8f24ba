//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::CycleStarted { cause, boot_count } => {
                info!("WAKE  | cause={:?} boot=#{}", cause, boot_count);
            }
            AppEvent::ModeOverridden { configured, switch } => {
                info!("MODE  | switch={} (stored {})", switch.as_str(), configured.as_str());
            }
            AppEvent::Sensed(r) => {
                let light = match r.light {
                    Ok(level) => level as i32,
                    Err(_) => -1,
                };
                info!(
                    "SENSE | light={} T={} batt={} | t={}ms",
                    light,
                    r.temperature_c
                        .map_or_else(|| "-".into(), |c| format!("{:.1}\u{00b0}C", c)),
                    r.battery_mv
                        .map_or_else(|| "-".into(), |mv| format!("{}mV", mv)),
                    r.timestamp_ms,
                );
            }
            AppEvent::Decided(d) => {
                info!("ACT   | {:?} ({:?})", d.kind, d.reason);
            }
            AppEvent::StepFailed { step, error } => {
                warn!("STEP  | {:?} failed: {}", step, error);
            }
            AppEvent::SleepArmed { wake_at, after_secs } => {
                info!("SLEEP | until {} ({}s)", wake_at, after_secs);
            }
            AppEvent::AlarmFallback(e) => {
                warn!("SLEEP | alarm rejected ({}), using fallback", e);
            }
        }
    }
}
