//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ BirdService (domain)
//! ```
//!
//! Driven adapters (sensors, actuators, clock, wake alarm, storage, event
//! sinks) implement these traits.  The
//! [`BirdService`](super::service::BirdService) consumes them via generics,
//! so the wake-cycle logic never touches hardware directly and every port
//! can be replaced by a recording fake in tests.
//!
//! ## Notes
//!
//! - **ConfigPort** implementations MUST validate before persisting.
//! - Actuator operations are idempotent; calling `off()` on dark eyes is
//!   not an error.
//! - All port errors are typed — callers must handle every variant explicitly.

use core::time::Duration;

use chrono::NaiveDateTime;

use crate::config::{BirdConfig, Mode};
use crate::error::{ActuatorError, AlarmError, SensorError};

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// One wake cycle's worth of sensor data.  Never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    /// Averaged photocell ADC value (higher = brighter), or why it failed.
    pub light: Result<u16, SensorError>,
    /// Board temperature in °C, when a sensor is fitted.
    pub temperature_c: Option<f32>,
    /// Battery voltage in millivolts, when the bird runs on a cell.
    pub battery_mv: Option<u16>,
    /// Monotonic milliseconds since boot when the light sample was taken.
    pub timestamp_ms: u64,
}

/// Read-side port: the domain calls this once per wake cycle.
pub trait SensorPort {
    /// Read the ambient light level (12-bit ADC scale, 0–4095).
    fn read_light(&mut self) -> Result<u16, SensorError>;

    /// Board temperature in °C.  Birds without a sensor return `None`.
    fn read_temperature(&mut self) -> Option<f32> {
        None
    }

    /// Battery voltage in mV.  Mains-powered birds return `None`.
    fn read_battery_mv(&mut self) -> Option<u16> {
        None
    }
}

// ───────────────────────────────────────────────────────────────
// Actuator ports (driven adapters: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Movement patterns understood by the neck servo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeckPattern {
    /// Full turn: top, bottom, back to centre.
    Sweep,
    /// Short look up, then back to centre.
    Glance,
}

/// Index into the speaker's clip bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClipId(pub u8);

impl ClipId {
    /// The caw used for clock chimes and the boot flourish.
    pub const CAW: ClipId = ClipId(0);
}

/// LED eyes.
pub trait Eyes {
    /// Fade the eyes fully on.
    fn on(&mut self) -> Result<(), ActuatorError>;

    /// Fade the eyes fully off.
    fn off(&mut self) -> Result<(), ActuatorError>;

    /// Flash `count` times, ending dark.
    fn flash(&mut self, count: u8) -> Result<(), ActuatorError>;
}

/// Neck servo.
pub trait Neck {
    /// Run a movement pattern to completion, ending at the centre position.
    fn rotate(&mut self, pattern: NeckPattern) -> Result<(), ActuatorError>;
}

/// Speaker / amplifier.
pub trait Speaker {
    /// Play one clip to completion at `volume` (0.0–1.0).
    fn play(&mut self, clip: ClipId, volume: f32) -> Result<(), ActuatorError>;

    /// Number of clips available; valid ids are `0..clip_count()`.
    fn clip_count(&self) -> u8;
}

/// Physical mode toggle fitted to some birds.
pub trait ModeSwitch {
    /// Poll the switch once.  `None` when no switch is fitted, in which
    /// case the configured mode applies.
    fn read_mode(&mut self) -> Option<Mode>;
}

/// Everything a bird body offers to the wake cycle, as one bound.
pub trait BirdHardware: SensorPort + Eyes + Neck + Speaker + ModeSwitch {}

impl<T: SensorPort + Eyes + Neck + Speaker + ModeSwitch> BirdHardware for T {}

// ───────────────────────────────────────────────────────────────
// Clock & wake alarm ports (driven adapters: platform timekeeping)
// ───────────────────────────────────────────────────────────────

/// Wall-clock and monotonic time.
pub trait ClockPort {
    /// Local wall-clock time.
    fn now(&self) -> NaiveDateTime;

    /// Milliseconds since boot.
    fn monotonic_ms(&self) -> u64;
}

/// Why the chip is running this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeCause {
    /// Power was applied (first boot, battery swap, reset button).
    ColdBoot,
    /// The armed wake alarm fired.
    Alarm,
    /// Any other reset: watchdog, brownout, software restart.
    Other,
}

/// Fire-once wake alarm plus the deep-sleep entry point.
pub trait WakeAlarm {
    /// Report what started this cycle.
    fn wake_cause(&self) -> WakeCause;

    /// Arm the alarm to fire `after` from now.  Re-arming replaces the
    /// previous duration.
    fn arm(&mut self, after: Duration) -> Result<(), AlarmError>;

    /// Enter deep sleep.  Does not return on the device; the next cycle
    /// starts from reset.  Simulation backends record the call and return.
    fn sleep(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists the bird's configuration record.
///
/// Loading never fails: missing or malformed fields fall back to their
/// defaults one by one.  Saving validates every field and rejects the
/// whole record with [`ConfigError::Validation`] naming the first offending
/// field; the stored record is then left untouched.
pub trait ConfigPort {
    /// Load configuration, substituting defaults field by field.
    fn load(&self) -> BirdConfig;

    /// Validate and persist configuration.
    fn save(&mut self, config: &BirdConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage for the config record and schedule state.
///
/// - Keys are namespaced to prevent collisions between subsystems.
/// - Write operations MUST be atomic — no partial writes on power loss.
///   The ESP-IDF NVS API guarantees this natively; in-memory simulation
///   achieves it trivially.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed integrity / deserialization check.
    Corrupted,
    /// A config field failed format or range validation.
    Validation {
        field: &'static str,
        reason: &'static str,
    },
    /// Underlying storage failed while committing.
    Storage(StorageError),
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Generic I/O error.
    IoError,
}

impl From<StorageError> for ConfigError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::Validation { field, reason } => write!(f, "invalid {}: {}", field, reason),
            Self::Storage(e) => write!(f, "storage: {}", e),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
