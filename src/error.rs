//! Unified error types for the Corvid firmware.
//!
//! A single `Error` enum that every subsystem can convert into keeps the
//! wake cycle's error handling uniform.  All variants are `Copy` so they
//! can be recorded in fixed-capacity reports and events without allocation.
//!
//! Configuration and storage errors live next to their ports in
//! [`crate::app::ports`].

use core::fmt;

use crate::app::ports::{ConfigError, StorageError};

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor could not be read or returned out-of-range data.
    Sensor(SensorError),
    /// An actuator command failed.
    Actuator(ActuatorError),
    /// The wake alarm could not be armed, even with the fallback duration.
    Alarm(AlarmError),
    /// Configuration is invalid or could not be persisted.
    Config(ConfigError),
    /// Non-volatile storage failed.
    Storage(StorageError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Alarm(e) => write!(f, "alarm: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// ADC read returned an error or timed out.
    AdcReadFailed,
    /// The sensor is not fitted on this bird.
    NotPresent,
    /// Reading is outside the physically plausible range.
    OutOfRange,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdcReadFailed => write!(f, "ADC read failed"),
            Self::NotPresent => write!(f, "sensor not present"),
            Self::OutOfRange => write!(f, "reading out of range"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// PWM duty-cycle or frequency write failed.
    PwmWriteFailed,
    /// GPIO set failed (amplifier enable, servo power).
    GpioWriteFailed,
    /// The requested clip does not exist on this bird.
    UnknownClip,
    /// The driver is not fitted or was not initialised.
    Unavailable,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PwmWriteFailed => write!(f, "PWM write failed"),
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
            Self::UnknownClip => write!(f, "unknown clip"),
            Self::Unavailable => write!(f, "actuator unavailable"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Wake alarm errors
// ---------------------------------------------------------------------------

/// Failures of the platform wake-alarm primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmError {
    /// The requested sleep duration is zero or beyond what the RTC timer
    /// can represent.
    DurationOutOfRange,
    /// The platform rejected the timer wakeup source (raw ESP-IDF code).
    ArmFailed(i32),
}

impl fmt::Display for AlarmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DurationOutOfRange => write!(f, "sleep duration out of range"),
            Self::ArmFailed(rc) => write!(f, "timer wakeup rejected (rc={})", rc),
        }
    }
}

impl From<AlarmError> for Error {
    fn from(e: AlarmError) -> Self {
        Self::Alarm(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
