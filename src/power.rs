//! Power cycle controller.
//!
//! Decides when the bird next wakes and puts the chip into deep sleep until
//! then.  RAM does not survive deep sleep, so the small bookkeeping record
//! ([`ScheduleState`]) lives in the storage port between cycles.
//!
//! ```text
//!  now ──▶ + interval ──▶ in window? ──yes──▶ wake_at
//!          (grid-aligned       │
//!           in Clock mode)     no
//!                              ▼
//!                  next window opening ─────▶ wake_at
//! ```

use core::time::Duration;

use chrono::{DateTime, NaiveDateTime, TimeDelta, Timelike};
use log::{info, warn};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, StoragePort, StorageError, WakeAlarm, WakeCause};
use crate::config::{BirdConfig, CONFIG_NAMESPACE, Mode};
use crate::error::AlarmError;
use crate::selector::chime_offset_secs;

/// Sleep used when the computed wake instant cannot be armed.
pub const FALLBACK_SLEEP: Duration = Duration::from_secs(60 * 60);

/// Wake cadence while `debug` is set.
pub const DEBUG_INTERVAL_MINUTES: u32 = 1;

/// Storage key of the [`ScheduleState`] blob.
pub const STATE_KEY: &str = "sched";

const MINUTES_PER_DAY: u32 = 24 * 60;

// ═══════════════════════════════════════════════════════════════
//  Schedule bookkeeping
// ═══════════════════════════════════════════════════════════════

/// Persisted between wake cycles.  Timestamps are local wall-clock
/// seconds (the RTC keeps counting through deep sleep).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleState {
    pub last_wake: Option<i64>,
    pub next_wake: Option<i64>,
    /// Every boot, cold or alarm, since the record was created.
    pub boot_count: u32,
}

impl ScheduleState {
    /// Load from storage.  Missing or corrupt blobs start a fresh record.
    pub fn load<S: StoragePort + ?Sized>(store: &S) -> Self {
        let mut buf = [0u8; 32];
        match store.read(CONFIG_NAMESPACE, STATE_KEY, &mut buf) {
            Ok(len) => postcard::from_bytes(&buf[..len]).unwrap_or_else(|_| {
                warn!("power: schedule state corrupted, starting fresh");
                Self::default()
            }),
            Err(StorageError::NotFound) => Self::default(),
            Err(e) => {
                warn!("power: schedule state unreadable ({}), starting fresh", e);
                Self::default()
            }
        }
    }

    pub fn save<S: StoragePort + ?Sized>(&self, store: &mut S) -> Result<(), StorageError> {
        let mut buf = [0u8; 32];
        let bytes = postcard::to_slice(self, &mut buf).map_err(|_| StorageError::IoError)?;
        store.write(CONFIG_NAMESPACE, STATE_KEY, bytes)
    }

    /// Note the start of a wake cycle.
    pub fn record_wake(&mut self, now: NaiveDateTime) {
        self.boot_count = self.boot_count.wrapping_add(1);
        self.last_wake = Some(now.and_utc().timestamp());
    }

    pub fn record_next(&mut self, wake_at: NaiveDateTime) {
        self.next_wake = Some(wake_at.and_utc().timestamp());
    }

    /// The previously scheduled wake, if any.
    pub fn scheduled_wake(&self) -> Option<NaiveDateTime> {
        self.next_wake
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|dt| dt.naive_utc())
    }

    /// How far this wake deviates from the planned one (positive = late).
    /// Only meaningful on alarm wakes.
    pub fn drift_secs(&self, cause: WakeCause, now: NaiveDateTime) -> Option<i64> {
        if cause != WakeCause::Alarm {
            return None;
        }
        self.next_wake.map(|planned| now.and_utc().timestamp() - planned)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Next-wake computation
// ═══════════════════════════════════════════════════════════════

/// Deterministic next wake instant.  Always strictly after `now`.
pub fn compute_next_wake(now: NaiveDateTime, config: &BirdConfig) -> NaiveDateTime {
    next_wake_with(now, config, effective_interval(config))
}

/// Like [`compute_next_wake`], with Random-mode jitter of
/// ±`interval_variance` applied to the interval.
pub fn plan_next_wake(
    now: NaiveDateTime,
    config: &BirdConfig,
    rng: &mut dyn RngCore,
) -> NaiveDateTime {
    let interval = effective_interval(config).map(|minutes| {
        if config.debug || config.mode != Mode::Random || config.interval_variance <= 0.0 {
            return minutes;
        }
        let v = config.interval_variance;
        let factor = 1.0 + rng.gen_range(-v..=v);
        ((minutes as f32 * factor).round() as u32).max(1)
    });
    next_wake_with(now, config, interval)
}

fn effective_interval(config: &BirdConfig) -> Option<u32> {
    if config.debug {
        return Some(DEBUG_INTERVAL_MINUTES);
    }
    config.interval_minutes.map(u32::from)
}

fn next_wake_with(now: NaiveDateTime, config: &BirdConfig, interval: Option<u32>) -> NaiveDateTime {
    let window = config.window();

    let Some(minutes) = interval else {
        // Scheduled behavior off: look again at the next opening.
        return window.next_start_at_or_after(now + TimeDelta::seconds(1));
    };

    let candidate = if config.mode == Mode::Clock {
        // An early wake has already chimed the boundary ahead of it.
        let from = match chime_offset_secs(now.time()) {
            Some(ahead) if ahead > 0 => now + TimeDelta::seconds(ahead),
            _ => now,
        };
        next_grid_point(from, minutes)
    } else {
        now + TimeDelta::minutes(i64::from(minutes))
    };

    if window.contains(candidate.time()) {
        candidate
    } else {
        window.next_start_at_or_after(candidate)
    }
}

/// Next multiple of `minutes` counted from local midnight, strictly after
/// `now`.  The grid restarts at every midnight.
fn next_grid_point(now: NaiveDateTime, minutes: u32) -> NaiveDateTime {
    let minutes = minutes.clamp(1, MINUTES_PER_DAY);
    let elapsed = now.time().num_seconds_from_midnight() / 60;
    let next = ((elapsed / minutes) + 1) * minutes;
    let midnight = now.date().and_time(chrono::NaiveTime::MIN);
    midnight + TimeDelta::minutes(i64::from(next.min(MINUTES_PER_DAY)))
}

// ═══════════════════════════════════════════════════════════════
//  Sleep entry
// ═══════════════════════════════════════════════════════════════

/// How the chip went to sleep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SleepOutcome {
    pub armed_for: Duration,
    /// The computed instant could not be armed; [`FALLBACK_SLEEP`] was used.
    pub fallback: bool,
}

/// Arm the wake alarm for `wake_at` and enter deep sleep.
///
/// If the alarm refuses the computed duration, the bounded
/// [`FALLBACK_SLEEP`] is armed instead so the bird always wakes again.
/// Only when that fails too is the error returned; the caller must then
/// restart the chip rather than sleep without an alarm.
pub fn enter_sleep(
    alarm: &mut impl WakeAlarm,
    now: NaiveDateTime,
    wake_at: NaiveDateTime,
    sink: &mut impl EventSink,
) -> Result<SleepOutcome, AlarmError> {
    let after = (wake_at - now)
        .to_std()
        .ok()
        .filter(|d| !d.is_zero())
        .unwrap_or(FALLBACK_SLEEP);

    let outcome = match alarm.arm(after) {
        Ok(()) => {
            info!("power: sleeping {}s until {}", after.as_secs(), wake_at);
            sink.emit(&AppEvent::SleepArmed {
                wake_at,
                after_secs: after.as_secs(),
            });
            SleepOutcome {
                armed_for: after,
                fallback: false,
            }
        }
        Err(e) => {
            warn!("power: alarm rejected {}s ({}), falling back", after.as_secs(), e);
            sink.emit(&AppEvent::AlarmFallback(e));
            alarm.arm(FALLBACK_SLEEP)?;
            SleepOutcome {
                armed_for: FALLBACK_SLEEP,
                fallback: true,
            }
        }
    };

    alarm.sleep();
    Ok(outcome)
}
