//! Daily activity window.
//!
//! The bird may only act between `earliest` (inclusive) and `latest`
//! (exclusive).  A window whose `latest` is before its `earliest` wraps
//! across midnight:
//!
//! ```text
//!   07:00 ─────────── 23:00            (earliest < latest)
//!   ██████████████████░░░░░░░░
//!
//!   22:00 ─── 24:00 ─── 02:00          (latest < earliest, wraps)
//!   ░░░░░░░░░░████████████░░░░
//! ```

use chrono::{NaiveDateTime, NaiveTime, TimeDelta};

/// Build a time-of-day from hour and minute, saturating to midnight on
/// out-of-range input.
pub fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default()
}

/// Time-of-day range during which the bird is allowed to act.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveWindow {
    pub earliest: NaiveTime,
    pub latest: NaiveTime,
}

impl ActiveWindow {
    pub fn new(earliest: NaiveTime, latest: NaiveTime) -> Self {
        Self { earliest, latest }
    }

    /// A window with identical bounds admits no time at all.
    pub fn is_empty(&self) -> bool {
        self.earliest == self.latest
    }

    /// Whether the window spans midnight.
    pub fn wraps_midnight(&self) -> bool {
        self.latest < self.earliest
    }

    /// Check if the given time-of-day is inside the window.
    pub fn contains(&self, t: NaiveTime) -> bool {
        if self.earliest <= self.latest {
            // e.g., 07:00..23:00
            t >= self.earliest && t < self.latest
        } else {
            // e.g., 22:00..02:00 — wraps around midnight
            t >= self.earliest || t < self.latest
        }
    }

    /// The first window opening at or after `dt`.
    pub fn next_start_at_or_after(&self, dt: NaiveDateTime) -> NaiveDateTime {
        let today = dt.date().and_time(self.earliest);
        if today >= dt {
            today
        } else {
            today
                .checked_add_signed(TimeDelta::days(1))
                .unwrap_or(NaiveDateTime::MAX)
        }
    }
}
