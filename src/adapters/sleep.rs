//! Deep-sleep wake alarm adapter.
//!
//! - **`target_os = "espidf"`** — reset reason + wakeup cause from
//!   ESP-IDF, the RTC timer as the only wake source, and
//!   `esp_deep_sleep_start()` (which never returns; the next cycle starts
//!   at `main()`).
//! - **`not(target_os = "espidf")`** — records what was armed so host
//!   tests and the simulator can inspect it; `sleep()` returns.

use core::time::Duration;

use log::info;

use crate::app::ports::{WakeAlarm, WakeCause};
use crate::error::AlarmError;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

/// Longest sleep the RTC timer is asked for (two days).
pub const MAX_SLEEP: Duration = Duration::from_secs(2 * 24 * 60 * 60);

pub struct DeepSleepAlarm {
    #[cfg(not(target_os = "espidf"))]
    cause: WakeCause,
    #[cfg(not(target_os = "espidf"))]
    armed: Option<Duration>,
    #[cfg(not(target_os = "espidf"))]
    slept: bool,
}

impl DeepSleepAlarm {
    #[cfg(target_os = "espidf")]
    pub fn new() -> Self {
        Self {}
    }

    /// Simulated alarm reporting `cause` for this boot.
    #[cfg(not(target_os = "espidf"))]
    pub fn new(cause: WakeCause) -> Self {
        Self {
            cause,
            armed: None,
            slept: false,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn armed(&self) -> Option<Duration> {
        self.armed
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn slept(&self) -> bool {
        self.slept
    }
}

fn check_duration(after: Duration) -> Result<u64, AlarmError> {
    if after.is_zero() || after > MAX_SLEEP {
        return Err(AlarmError::DurationOutOfRange);
    }
    u64::try_from(after.as_micros()).map_err(|_| AlarmError::DurationOutOfRange)
}

#[cfg(target_os = "espidf")]
impl WakeAlarm for DeepSleepAlarm {
    fn wake_cause(&self) -> WakeCause {
        // SAFETY: read-only queries of boot-time state.
        let wakeup = unsafe { esp_sleep_get_wakeup_cause() };
        if wakeup == esp_sleep_source_t_ESP_SLEEP_WAKEUP_TIMER {
            return WakeCause::Alarm;
        }
        let reset = unsafe { esp_reset_reason() };
        if reset == esp_reset_reason_t_ESP_RST_POWERON || reset == esp_reset_reason_t_ESP_RST_EXT {
            WakeCause::ColdBoot
        } else {
            WakeCause::Other
        }
    }

    fn arm(&mut self, after: Duration) -> Result<(), AlarmError> {
        let us = check_duration(after)?;
        // SAFETY: configures the RTC timer wake source; no other task
        // touches sleep configuration.
        let ret = unsafe { esp_sleep_enable_timer_wakeup(us) };
        if ret != ESP_OK as i32 {
            return Err(AlarmError::ArmFailed(ret));
        }
        info!("sleep: timer wakeup armed ({}s)", after.as_secs());
        Ok(())
    }

    fn sleep(&mut self) {
        info!("sleep: entering deep sleep");
        // SAFETY: does not return; RAM is lost and the chip reboots into main().
        unsafe { esp_deep_sleep_start() };
    }
}

#[cfg(not(target_os = "espidf"))]
impl WakeAlarm for DeepSleepAlarm {
    fn wake_cause(&self) -> WakeCause {
        self.cause
    }

    fn arm(&mut self, after: Duration) -> Result<(), AlarmError> {
        check_duration(after)?;
        info!("sleep(sim): armed for {}s", after.as_secs());
        self.armed = Some(after);
        Ok(())
    }

    fn sleep(&mut self) {
        info!("sleep(sim): would deep sleep now");
        self.slept = true;
    }
}
