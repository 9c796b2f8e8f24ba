//! Application service — the hexagonal core.
//!
//! [`BirdService`] runs one wake cycle from top to bottom.  The chip
//! loses RAM in deep sleep, so there is no long-lived loop: `main()` calls
//! [`BirdService::run_cycle`] once per wake and the cycle ends by arming
//! the wake alarm.  All I/O flows through port traits injected at the call
//! site, making the whole cycle testable with mock adapters.
//!
//! ```text
//!  WakeAlarm ──▶ ┌─────────────────────────────────┐ ──▶ EventSink
//!  Storage   ──▶ │          BirdService             │
//!  Sensors   ──▶ │ light gate · selector · planner  │ ──▶ Eyes/Neck/Speaker
//!  Clock     ──▶ └─────────────────────────────────┘ ──▶ WakeAlarm
//! ```

use chrono::NaiveDateTime;
use log::{info, warn};
use rand::RngCore;

use crate::config::{BirdConfig, Mode};
use crate::error::Result;
use crate::light::is_light_sufficient;
use crate::power::{self, ScheduleState, SleepOutcome};
use crate::selector::context::SelectorInput;
use crate::selector::{self, Decision};
use crate::sequencer::{self, SequenceReport};

use super::events::AppEvent;
use super::ports::{
    BirdHardware, ClockPort, ConfigPort, EventSink, SensorReading, StoragePort, WakeAlarm,
    WakeCause,
};

/// Everything that happened during one wake cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub cause: WakeCause,
    pub boot_count: u32,
    /// Mode in effect for this cycle (switch position wins).
    pub mode: Mode,
    pub reading: SensorReading,
    pub decision: Decision,
    /// Present on cold boot only.
    pub flourish: Option<SequenceReport>,
    pub sequence: SequenceReport,
    pub next_wake: NaiveDateTime,
    pub sleep: SleepOutcome,
}

/// The application service orchestrates one wake cycle.
pub struct BirdService<R> {
    rng: R,
}

impl<R: RngCore> BirdService<R> {
    /// `rng` drives Random-mode clip picks and sleep jitter.  Seed it from
    /// the hardware RNG on the device and from a constant in tests.
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Run one full wake cycle: load → sense → decide → act → sleep.
    ///
    /// The `hw` parameter satisfies every hardware port at once, which
    /// avoids a double mutable borrow while keeping the port boundary
    /// explicit.  Actuator and sensor failures degrade inside the cycle;
    /// the only error returned is an alarm that cannot be armed at all,
    /// after which the caller must restart the chip.
    pub fn run_cycle<H, S>(
        &mut self,
        hw: &mut H,
        clock: &impl ClockPort,
        alarm: &mut impl WakeAlarm,
        store: &mut S,
        sink: &mut impl EventSink,
    ) -> Result<CycleReport>
    where
        H: BirdHardware,
        S: StoragePort + ConfigPort,
    {
        // 1. Why are we awake?
        let cause = alarm.wake_cause();
        let woke_at = clock.now();
        let mut state = ScheduleState::load(store);
        if let Some(drift) = state.drift_secs(cause, woke_at) {
            info!("cycle: woke {}s from plan", drift);
        }
        state.record_wake(woke_at);
        sink.emit(&AppEvent::CycleStarted {
            cause,
            boot_count: state.boot_count,
        });
        info!(
            "cycle: {:?} wake #{} at {}",
            cause, state.boot_count, woke_at
        );

        // 2. Configuration, with the mode switch applied for this cycle only
        let stored = store.load();
        let mode = self.effective_mode(hw, stored.mode, sink);
        let config = BirdConfig { mode, ..stored };

        // 3. Cold-boot gesture
        let flourish = if cause == WakeCause::ColdBoot {
            Some(sequencer::flourish(hw, mode, config.volume, sink))
        } else {
            None
        };

        // 4. Sense once
        let reading = SensorReading {
            light: hw.read_light(),
            temperature_c: hw.read_temperature(),
            battery_mv: hw.read_battery_mv(),
            timestamp_ms: clock.monotonic_ms(),
        };
        sink.emit(&AppEvent::Sensed(reading));

        // 5. Decide
        let input = SelectorInput {
            now: clock.now().time(),
            light_sufficient: is_light_sufficient(reading.light, config.light_threshold),
            mode,
            clip_count: hw.clip_count(),
            battery_critical: battery_critical(&config, reading.battery_mv),
        };
        let decision = selector::select(&input, &config, &mut self.rng);
        sink.emit(&AppEvent::Decided(decision));

        // 6. Act
        let sequence = sequencer::execute(&decision, hw, config.volume, sink);

        // 7. Plan and sleep
        let now = clock.now();
        let next_wake = power::plan_next_wake(now, &config, &mut self.rng);
        state.record_next(next_wake);
        if let Err(e) = state.save(store) {
            warn!("cycle: schedule state not saved ({})", e);
        }

        let sleep = power::enter_sleep(alarm, now, next_wake, sink)?;

        Ok(CycleReport {
            cause,
            boot_count: state.boot_count,
            mode,
            reading,
            decision,
            flourish,
            sequence,
            next_wake,
            sleep,
        })
    }

    fn effective_mode(
        &self,
        hw: &mut impl BirdHardware,
        configured: Mode,
        sink: &mut impl EventSink,
    ) -> Mode {
        match hw.read_mode() {
            Some(switch) if switch != configured => {
                info!("cycle: mode switch says {:?}, stored {:?}", switch, configured);
                sink.emit(&AppEvent::ModeOverridden { configured, switch });
                switch
            }
            Some(switch) => switch,
            None => configured,
        }
    }
}

/// Below the configured floor.  An unknown voltage never counts as critical.
fn battery_critical(config: &BirdConfig, battery_mv: Option<u16>) -> bool {
    config.battery_critical_mv > 0 && battery_mv.is_some_and(|mv| mv < config.battery_critical_mv)
}
