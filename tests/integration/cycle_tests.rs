//! End-to-end wake cycles against mock adapters.

use core::time::Duration;

use chrono::TimeDelta;
use corvid::app::events::AppEvent;
use corvid::app::ports::{ClipId, ConfigPort, NeckPattern, StoragePort, WakeCause};
use corvid::app::service::{BirdService, CycleReport};
use corvid::config::{self, BirdConfig, Mode};
use corvid::error::{ActuatorError, AlarmError, Error};
use corvid::power::{FALLBACK_SLEEP, ScheduleState};
use corvid::selector::{DecisionKind, Reason};
use corvid::sequencer::Step;
use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::mock_hw::{
    ActuatorCall, FakeAlarm, FakeClock, MemStore, MockHardware, RecordingSink, at,
};

struct Rig {
    hw: MockHardware,
    clock: FakeClock,
    alarm: FakeAlarm,
    store: MemStore,
    sink: RecordingSink,
}

impl Rig {
    fn new(hour: u32, minute: u32, cause: WakeCause) -> Self {
        Self {
            hw: MockHardware::new(),
            clock: FakeClock::at(hour, minute),
            alarm: FakeAlarm::new(cause),
            store: MemStore::new(),
            sink: RecordingSink::default(),
        }
    }

    fn with_config(mut self, config: &BirdConfig) -> Self {
        self.store = MemStore::with_config(config);
        self
    }

    fn run(&mut self) -> Result<CycleReport, Error> {
        let mut service = BirdService::new(SmallRng::seed_from_u64(7));
        service.run_cycle(
            &mut self.hw,
            &self.clock,
            &mut self.alarm,
            &mut self.store,
            &mut self.sink,
        )
    }
}

fn random_mode() -> BirdConfig {
    BirdConfig {
        mode: Mode::Random,
        ..Default::default()
    }
}

// ── Selection outcomes ────────────────────────────────────────

#[test]
fn outside_window_touches_no_actuator() {
    let mut rig = Rig::new(3, 0, WakeCause::Alarm);
    let report = rig.run().unwrap();

    assert_eq!(report.decision.reason, Reason::OutsideWindow);
    assert!(rig.hw.calls.is_empty());
    assert!(report.sequence.is_clean());
    assert_eq!(report.next_wake, at(7, 0));
    assert_eq!(rig.alarm.armed, vec![Duration::from_secs(4 * 3600)]);
    assert!(rig.alarm.slept);
}

#[test]
fn dark_room_only_flashes() {
    let mut rig = Rig::new(10, 30, WakeCause::Alarm);
    rig.hw = MockHardware::dark();
    let report = rig.run().unwrap();

    assert_eq!(report.decision.reason, Reason::Dark);
    assert_eq!(rig.hw.calls, vec![ActuatorCall::Flash(2)]);
    assert_eq!(rig.hw.plays(), 0);
}

#[test]
fn failed_light_sensor_counts_as_dark() {
    let mut rig = Rig::new(10, 30, WakeCause::Alarm);
    rig.hw.light = Err(corvid::error::SensorError::AdcReadFailed);
    let report = rig.run().unwrap();

    assert_eq!(report.decision.reason, Reason::Dark);
    assert_eq!(rig.hw.calls, vec![ActuatorCall::Flash(2)]);
}

#[test]
fn random_mode_runs_full_sequence_in_order() {
    let mut rig = Rig::new(10, 17, WakeCause::Alarm).with_config(&random_mode());
    let report = rig.run().unwrap();

    assert_eq!(report.decision.reason, Reason::RandomClip);
    assert_eq!(rig.hw.calls.len(), 4);
    assert_eq!(rig.hw.calls[0], ActuatorCall::EyesOn);
    assert_eq!(rig.hw.calls[1], ActuatorCall::Rotate(NeckPattern::Glance));
    match rig.hw.calls[2] {
        ActuatorCall::Play { clip, volume } => {
            assert!(clip.0 < rig.hw.clips);
            assert!((volume - 0.6).abs() < f32::EPSILON);
        }
        other => panic!("expected a clip, got {:?}", other),
    }
    assert_eq!(rig.hw.calls[3], ActuatorCall::EyesOff);
    assert!(!rig.hw.eyes_lit());

    assert_eq!(report.next_wake, at(11, 17));
    assert_eq!(report.sleep.armed_for, Duration::from_secs(3600));
}

#[test]
fn clock_mode_chimes_the_hour() {
    let mut rig = Rig::new(10, 0, WakeCause::Alarm);
    let report = rig.run().unwrap();

    assert_eq!(report.decision.reason, Reason::Chime);
    assert_eq!(rig.hw.calls[1], ActuatorCall::Rotate(NeckPattern::Sweep));
    assert_eq!(rig.hw.plays(), 10);
    assert!(rig.hw.calls.iter().all(|c| match c {
        ActuatorCall::Play { clip, .. } => *clip == ClipId::CAW,
        _ => true,
    }));
    assert_eq!(report.next_wake, at(11, 0));
}

#[test]
fn early_wake_chimes_once_per_boundary() {
    let mut rig = Rig::new(13, 59, WakeCause::Alarm);
    rig.clock.now += TimeDelta::seconds(10);
    let report = rig.run().unwrap();

    assert_eq!(report.decision.reason, Reason::Chime);
    assert_eq!(rig.hw.plays(), 2);
    assert_eq!(report.next_wake, at(15, 0));
}

#[test]
fn clock_mode_between_chimes_stays_silent() {
    let mut rig = Rig::new(10, 20, WakeCause::Alarm);
    let report = rig.run().unwrap();

    assert_eq!(report.decision.reason, Reason::BetweenChimes);
    assert_eq!(
        rig.hw.calls,
        vec![
            ActuatorCall::EyesOn,
            ActuatorCall::Rotate(NeckPattern::Sweep),
            ActuatorCall::EyesOff,
        ]
    );
}

#[test]
fn critical_battery_flashes_warning() {
    let mut rig = Rig::new(10, 0, WakeCause::Alarm);
    rig.hw.battery_mv = Some(2800);
    let report = rig.run().unwrap();

    assert_eq!(report.decision.reason, Reason::CriticalBattery);
    assert_eq!(rig.hw.calls, vec![ActuatorCall::Flash(5)]);
}

#[test]
fn interval_off_sleeps_until_next_opening() {
    let config = BirdConfig {
        interval_minutes: None,
        ..Default::default()
    };
    let mut rig = Rig::new(10, 0, WakeCause::Alarm).with_config(&config);
    let report = rig.run().unwrap();

    assert_eq!(report.decision.reason, Reason::IntervalOff);
    assert!(rig.hw.calls.is_empty());
    assert_eq!(report.next_wake, at(7, 0) + TimeDelta::days(1));
}

#[test]
fn debug_mode_wakes_every_minute() {
    let config = BirdConfig {
        debug: true,
        ..random_mode()
    };
    let mut rig = Rig::new(10, 17, WakeCause::Alarm).with_config(&config);
    let report = rig.run().unwrap();

    assert_eq!(report.next_wake, at(10, 18));
}

// ── Actuator failures ─────────────────────────────────────────

#[test]
fn broken_speaker_does_not_leave_eyes_lit() {
    let mut rig = Rig::new(10, 17, WakeCause::Alarm).with_config(&random_mode());
    rig.hw.speaker_broken = true;
    let report = rig.run().unwrap();

    assert_eq!(report.sequence.failures.len(), 1);
    assert_eq!(report.sequence.failures[0].step, Step::SpeakerPlay);
    assert_eq!(rig.hw.calls.last(), Some(&ActuatorCall::EyesOff));
    assert!(rig.sink.events.contains(&AppEvent::StepFailed {
        step: Step::SpeakerPlay,
        error: ActuatorError::Unavailable,
    }));
    assert!(rig.alarm.slept);
}

// ── Cold boot ─────────────────────────────────────────────────

#[test]
fn cold_boot_runs_flourish_even_at_night() {
    let mut rig = Rig::new(3, 0, WakeCause::ColdBoot);
    let report = rig.run().unwrap();

    assert!(report.flourish.is_some());
    assert_eq!(
        rig.hw.calls,
        vec![
            ActuatorCall::EyesOn,
            ActuatorCall::Rotate(NeckPattern::Sweep),
            ActuatorCall::Play {
                clip: ClipId::CAW,
                volume: 0.6,
            },
            ActuatorCall::EyesOff,
            ActuatorCall::Flash(Mode::Clock.position()),
        ]
    );
    assert_eq!(report.decision.kind, DecisionKind::Skip);
}

#[test]
fn alarm_wake_skips_flourish() {
    let mut rig = Rig::new(3, 0, WakeCause::Alarm);
    assert!(rig.run().unwrap().flourish.is_none());
}

#[test]
fn other_reset_skips_flourish() {
    let mut rig = Rig::new(3, 0, WakeCause::Other);
    assert!(rig.run().unwrap().flourish.is_none());
    assert!(rig.hw.calls.is_empty());
}

// ── Sleep entry ───────────────────────────────────────────────

#[test]
fn rejected_alarm_falls_back() {
    let mut rig = Rig::new(10, 30, WakeCause::Alarm);
    rig.alarm.failing_arms = 1;
    let report = rig.run().unwrap();

    assert!(report.sleep.fallback);
    assert_eq!(report.sleep.armed_for, FALLBACK_SLEEP);
    assert_eq!(rig.alarm.armed, vec![FALLBACK_SLEEP]);
    assert!(
        rig.sink
            .events
            .contains(&AppEvent::AlarmFallback(AlarmError::ArmFailed(-1)))
    );
    assert!(rig.alarm.slept);
}

#[test]
fn unarmable_alarm_is_an_error() {
    let mut rig = Rig::new(10, 30, WakeCause::Alarm);
    rig.alarm.failing_arms = 2;
    let result = rig.run();

    assert!(matches!(
        result,
        Err(Error::Alarm(AlarmError::ArmFailed(-1)))
    ));
    assert!(!rig.alarm.slept);
}

// ── Configuration and persistence ─────────────────────────────

#[test]
fn bad_stored_field_falls_back_alone() {
    let mut rig = Rig::new(10, 17, WakeCause::Alarm);
    let json = br#"{"earliest":"07:00","latest":"23:00","interval":"1:00","light_threshold":1200,"volume":7.5,"mode":"random","debug":false}"#;
    rig.store
        .write(config::CONFIG_NAMESPACE, config::CONFIG_KEY, json)
        .unwrap();
    let report = rig.run().unwrap();

    assert_eq!(report.mode, Mode::Random);
    assert!(rig.hw.calls.iter().any(|c| matches!(
        c,
        ActuatorCall::Play { volume, .. } if (*volume - 0.6).abs() < f32::EPSILON
    )));
}

#[test]
fn mode_switch_overrides_for_one_cycle() {
    let mut rig = Rig::new(10, 17, WakeCause::Alarm).with_config(&BirdConfig::default());
    rig.hw.switch = Some(Mode::Random);
    let report = rig.run().unwrap();

    assert_eq!(report.mode, Mode::Random);
    assert_eq!(report.decision.reason, Reason::RandomClip);
    assert!(rig.sink.events.contains(&AppEvent::ModeOverridden {
        configured: Mode::Clock,
        switch: Mode::Random,
    }));
    assert_eq!(rig.store.load().mode, Mode::Clock);
}

#[test]
fn matching_switch_emits_nothing() {
    let mut rig = Rig::new(10, 17, WakeCause::Alarm);
    rig.hw.switch = Some(Mode::Clock);
    rig.run().unwrap();

    assert!(
        !rig.sink
            .events
            .iter()
            .any(|e| matches!(e, AppEvent::ModeOverridden { .. }))
    );
}

#[test]
fn schedule_state_survives_between_cycles() {
    let mut rig = Rig::new(3, 0, WakeCause::ColdBoot);
    let first = rig.run().unwrap();
    assert_eq!(first.boot_count, 1);

    rig.alarm = FakeAlarm::new(WakeCause::Alarm);
    rig.clock.now = first.next_wake;
    rig.hw.calls.clear();
    let second = rig.run().unwrap();
    assert_eq!(second.boot_count, 2);
    assert_eq!(second.decision.reason, Reason::Chime);

    let state = ScheduleState::load(&rig.store);
    assert_eq!(state.boot_count, 2);
    assert_eq!(state.scheduled_wake(), Some(second.next_wake));
}

#[test]
fn events_follow_cycle_order() {
    let mut rig = Rig::new(10, 20, WakeCause::Alarm);
    rig.run().unwrap();

    let kinds: Vec<&str> = rig
        .sink
        .events
        .iter()
        .map(|e| match e {
            AppEvent::CycleStarted { .. } => "started",
            AppEvent::ModeOverridden { .. } => "override",
            AppEvent::Sensed(_) => "sensed",
            AppEvent::Decided(_) => "decided",
            AppEvent::StepFailed { .. } => "failed",
            AppEvent::SleepArmed { .. } => "armed",
            AppEvent::AlarmFallback(_) => "fallback",
        })
        .collect();
    assert_eq!(kinds, vec!["started", "sensed", "decided", "armed"]);
}
