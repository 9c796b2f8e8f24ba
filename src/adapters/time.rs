//! ESP32 clock adapter.
//!
//! Provides the local wall clock and a monotonic counter.
//!
//! - **`target_os = "espidf"`** — wall time from `gettimeofday()` +
//!   `localtime_r()` (the RTC keeps counting through deep sleep, and the
//!   TZ variable set by the setup page applies), monotonic time from
//!   `esp_timer_get_time()`.
//! - **`not(target_os = "espidf")`** — a settable base wall time advanced by
//!   `std::time::Instant`, for host-side testing and simulation.

use chrono::NaiveDateTime;

use crate::app::ports::ClockPort;

/// Clock adapter for the ESP32-S3 platform.
pub struct Esp32Clock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
    #[cfg(not(target_os = "espidf"))]
    base: NaiveDateTime,
}

impl Default for Esp32Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32Clock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
            #[cfg(not(target_os = "espidf"))]
            base: NaiveDateTime::default(),
        }
    }

    /// Pin the simulated wall clock to `now`.
    #[cfg(not(target_os = "espidf"))]
    pub fn set_wall_clock(&mut self, now: NaiveDateTime) {
        self.base = now;
        self.start = std::time::Instant::now();
    }

    /// `false` until the RTC has been set (it reads 1970 after a cold boot
    /// with no backup supply).
    #[cfg(target_os = "espidf")]
    pub fn is_set(&self) -> bool {
        // Reject obviously unsynced time (e.g. before 2020-01-01)
        const EPOCH_2020: i64 = 1_577_836_800;
        Self::epoch_secs() >= EPOCH_2020
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn is_set(&self) -> bool {
        self.base != NaiveDateTime::default()
    }

    #[cfg(target_os = "espidf")]
    fn epoch_secs() -> i64 {
        let mut tv = esp_idf_svc::sys::timeval {
            tv_sec: 0,
            tv_usec: 0,
        };
        if unsafe { esp_idf_svc::sys::gettimeofday(&mut tv, core::ptr::null_mut()) } != 0 {
            return 0;
        }
        tv.tv_sec as i64
    }
}

#[cfg(target_os = "espidf")]
impl ClockPort for Esp32Clock {
    fn now(&self) -> NaiveDateTime {
        use chrono::NaiveDate;

        let secs = Self::epoch_secs() as esp_idf_svc::sys::time_t;
        let mut tm: esp_idf_svc::sys::tm = unsafe { core::mem::zeroed() };
        if unsafe { esp_idf_svc::sys::localtime_r(&secs, &mut tm) }.is_null() {
            return NaiveDateTime::default();
        }
        NaiveDate::from_ymd_opt(tm.tm_year + 1900, (tm.tm_mon + 1) as u32, tm.tm_mday as u32)
            .and_then(|d| d.and_hms_opt(tm.tm_hour as u32, tm.tm_min as u32, tm.tm_sec as u32))
            .unwrap_or_default()
    }

    fn monotonic_ms(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64 / 1_000
    }
}

#[cfg(not(target_os = "espidf"))]
impl ClockPort for Esp32Clock {
    fn now(&self) -> NaiveDateTime {
        let elapsed = chrono::TimeDelta::from_std(self.start.elapsed()).unwrap_or(chrono::TimeDelta::zero());
        self.base + elapsed
    }

    fn monotonic_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}
