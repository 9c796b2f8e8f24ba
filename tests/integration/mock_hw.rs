//! Mock hardware adapter for integration tests.
//!
//! Records every actuator call so tests can assert on the full command
//! history without touching real GPIO/PWM registers.

use chrono::{NaiveDate, NaiveDateTime};
use core::time::Duration;
use corvid::app::events::AppEvent;
use corvid::app::ports::{
    ClipId, ClockPort, ConfigError, ConfigPort, EventSink, Eyes, ModeSwitch, Neck, NeckPattern,
    SensorPort, Speaker, StorageError, StoragePort, WakeAlarm, WakeCause,
};
use corvid::config::{BirdConfig, Mode};
use corvid::error::{ActuatorError, AlarmError, SensorError};
use std::collections::HashMap;

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActuatorCall {
    EyesOn,
    EyesOff,
    Flash(u8),
    Rotate(NeckPattern),
    Play { clip: ClipId, volume: f32 },
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub calls: Vec<ActuatorCall>,
    pub light: Result<u16, SensorError>,
    pub battery_mv: Option<u16>,
    pub switch: Option<Mode>,
    pub clips: u8,
    pub speaker_broken: bool,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            light: Ok(3000),
            battery_mv: None,
            switch: None,
            clips: 4,
            speaker_broken: false,
        }
    }

    pub fn dark() -> Self {
        Self {
            light: Ok(10),
            ..Self::new()
        }
    }

    pub fn plays(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, ActuatorCall::Play { .. }))
            .count()
    }

    /// Eyes are lit after the last recorded call.
    pub fn eyes_lit(&self) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                ActuatorCall::EyesOn => Some(true),
                ActuatorCall::EyesOff | ActuatorCall::Flash(_) => Some(false),
                _ => None,
            })
            .unwrap_or(false)
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHardware {
    fn read_light(&mut self) -> Result<u16, SensorError> {
        self.light
    }

    fn read_battery_mv(&mut self) -> Option<u16> {
        self.battery_mv
    }
}

impl Eyes for MockHardware {
    fn on(&mut self) -> Result<(), ActuatorError> {
        self.calls.push(ActuatorCall::EyesOn);
        Ok(())
    }

    fn off(&mut self) -> Result<(), ActuatorError> {
        self.calls.push(ActuatorCall::EyesOff);
        Ok(())
    }

    fn flash(&mut self, count: u8) -> Result<(), ActuatorError> {
        self.calls.push(ActuatorCall::Flash(count));
        Ok(())
    }
}

impl Neck for MockHardware {
    fn rotate(&mut self, pattern: NeckPattern) -> Result<(), ActuatorError> {
        self.calls.push(ActuatorCall::Rotate(pattern));
        Ok(())
    }
}

impl Speaker for MockHardware {
    fn play(&mut self, clip: ClipId, volume: f32) -> Result<(), ActuatorError> {
        self.calls.push(ActuatorCall::Play { clip, volume });
        if self.speaker_broken {
            Err(ActuatorError::Unavailable)
        } else {
            Ok(())
        }
    }

    fn clip_count(&self) -> u8 {
        self.clips
    }
}

impl ModeSwitch for MockHardware {
    fn read_mode(&mut self) -> Option<Mode> {
        self.switch
    }
}

// ── MemStore ──────────────────────────────────────────────────

/// In-memory storage backing both the config record and schedule state.
#[derive(Default)]
pub struct MemStore {
    data: HashMap<(String, String), Vec<u8>>,
}

#[allow(dead_code)]
impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &BirdConfig) -> Self {
        let mut store = Self::new();
        corvid::config::save_to(&mut store, config).expect("valid test config");
        store
    }

    pub fn raw(&self, namespace: &str, key: &str) -> Option<&[u8]> {
        self.data
            .get(&(namespace.to_string(), key.to_string()))
            .map(Vec::as_slice)
    }
}

impl StoragePort for MemStore {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let data = self
            .data
            .get(&(namespace.to_string(), key.to_string()))
            .ok_or(StorageError::NotFound)?;
        if data.len() > buf.len() {
            return Err(StorageError::IoError);
        }
        buf[..data.len()].copy_from_slice(data);
        Ok(data.len())
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.data
            .insert((namespace.to_string(), key.to_string()), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.data.remove(&(namespace.to_string(), key.to_string()));
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.data
            .contains_key(&(namespace.to_string(), key.to_string()))
    }
}

impl ConfigPort for MemStore {
    fn load(&self) -> BirdConfig {
        corvid::config::load_from(self)
    }

    fn save(&mut self, config: &BirdConfig) -> Result<(), ConfigError> {
        corvid::config::save_to(self, config)
    }
}

// ── FakeClock ─────────────────────────────────────────────────

pub struct FakeClock {
    pub now: NaiveDateTime,
}

#[allow(dead_code)]
impl FakeClock {
    pub fn at(hour: u32, minute: u32) -> Self {
        Self { now: at(hour, minute) }
    }
}

impl ClockPort for FakeClock {
    fn now(&self) -> NaiveDateTime {
        self.now
    }

    fn monotonic_ms(&self) -> u64 {
        1_234
    }
}

/// 2024-06-01 at `hour:minute`.
pub fn at(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 1)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

// ── FakeAlarm ─────────────────────────────────────────────────

pub struct FakeAlarm {
    pub cause: WakeCause,
    /// Number of upcoming `arm` calls that fail.
    pub failing_arms: u8,
    pub armed: Vec<Duration>,
    pub slept: bool,
}

#[allow(dead_code)]
impl FakeAlarm {
    pub fn new(cause: WakeCause) -> Self {
        Self {
            cause,
            failing_arms: 0,
            armed: Vec::new(),
            slept: false,
        }
    }
}

impl WakeAlarm for FakeAlarm {
    fn wake_cause(&self) -> WakeCause {
        self.cause
    }

    fn arm(&mut self, after: Duration) -> Result<(), AlarmError> {
        if self.failing_arms > 0 {
            self.failing_arms -= 1;
            return Err(AlarmError::ArmFailed(-1));
        }
        self.armed.push(after);
        Ok(())
    }

    fn sleep(&mut self) {
        self.slept = true;
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
