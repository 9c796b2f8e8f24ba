//! Bird configuration record.
//!
//! The record is written by the external setup collaborator as a small
//! flat JSON object and read back once per wake cycle:
//!
//! ```json
//! {"earliest":"07:00","latest":"23:00","interval":"1:00",
//!  "light_threshold":1200,"volume":0.6,"mode":"clock","debug":false,
//!  "dark_flash_count":2,"interval_variance":0.0,"battery_critical_mv":3000}
//! ```
//!
//! Loading is forgiving: every field is decoded on its own and replaced by
//! its default when absent or invalid, so one bad value never costs the
//! others.  Saving is strict and all-or-nothing.

use chrono::{NaiveTime, Timelike};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::app::ports::{ConfigError, StoragePort};
use crate::schedule::{ActiveWindow, hm};

/// Storage namespace shared by every Corvid record.
pub const CONFIG_NAMESPACE: &str = "corvid";
/// Storage key of the configuration record.
pub const CONFIG_KEY: &str = "birdcfg";

/// Largest record the store will read back.
pub const MAX_RECORD_SIZE: usize = 512;

/// Full scale of the 12-bit light ADC.
pub const LIGHT_ADC_MAX: u16 = 4095;
/// Longest allowed wake interval (one day).
pub const MAX_INTERVAL_MINUTES: u16 = 1440;

/// Sound-selection personality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Chime the hour with caws.
    Clock,
    /// Pick any clip at random.
    Random,
}

impl Mode {
    /// 1-based position, used for the mode indicator flashes.
    pub fn position(self) -> u8 {
        match self {
            Self::Clock => 1,
            Self::Random => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Clock => "clock",
            Self::Random => "random",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clock" => Some(Self::Clock),
            "random" => Some(Self::Random),
            _ => None,
        }
    }
}

/// Validated, typed configuration threaded through one wake cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct BirdConfig {
    // --- Window ---
    /// First time of day the bird may act.
    pub earliest: NaiveTime,
    /// Time of day from which the bird stays quiet.
    pub latest: NaiveTime,

    // --- Cadence ---
    /// Minutes between wakes; `None` switches scheduled behavior off.
    pub interval_minutes: Option<u16>,
    /// Random-mode jitter applied to the interval (fraction, 0.0–0.5).
    pub interval_variance: f32,

    // --- Behavior ---
    /// Light ADC level at or above which the room counts as lit.
    pub light_threshold: u16,
    /// Speaker volume (0.0–1.0).
    pub volume: f32,
    pub mode: Mode,
    /// Eye flashes given instead of a full action in a dark room.
    pub dark_flash_count: u8,
    /// Battery level (mV) below which the bird only flashes a warning.
    /// 0 disables the check.
    pub battery_critical_mv: u16,

    /// Wake every minute regardless of `interval_minutes`.
    pub debug: bool,
}

impl Default for BirdConfig {
    fn default() -> Self {
        Self {
            earliest: hm(7, 0),
            latest: hm(23, 0),

            interval_minutes: Some(60),
            interval_variance: 0.0,

            light_threshold: 1200,
            volume: 0.6,
            mode: Mode::Clock,
            dark_flash_count: 2,
            battery_critical_mv: 3000, // 1S LiPo cutoff

            debug: false,
        }
    }
}

impl BirdConfig {
    /// The daily activity window.
    pub fn window(&self) -> ActiveWindow {
        ActiveWindow::new(self.earliest, self.latest)
    }

    /// Range-check every field.  The first failure names the field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.earliest == self.latest {
            return Err(invalid("latest", "window must not be empty"));
        }
        if let Some(minutes) = self.interval_minutes {
            if !(1..=MAX_INTERVAL_MINUTES).contains(&minutes) {
                return Err(invalid("interval", "must be 1–1440 minutes"));
            }
        }
        if !valid_variance(self.interval_variance) {
            return Err(invalid("interval_variance", "must be 0.0–0.5"));
        }
        if self.light_threshold > LIGHT_ADC_MAX {
            return Err(invalid("light_threshold", "must be 0–4095"));
        }
        if !valid_volume(self.volume) {
            return Err(invalid("volume", "must be 0.0–1.0"));
        }
        if !valid_flash_count(self.dark_flash_count) {
            return Err(invalid("dark_flash_count", "must be 1–10"));
        }
        if !valid_battery_mv(self.battery_critical_mv) {
            return Err(invalid("battery_critical_mv", "must be 0 or 2500–4200"));
        }
        Ok(())
    }

    /// Strictly convert the textual record (as submitted by the setup
    /// form) and validate it.
    pub fn from_record(record: &ConfigRecord) -> Result<Self, ConfigError> {
        let earliest =
            parse_time(&record.earliest).ok_or(invalid("earliest", "expected HH:MM"))?;
        let latest = parse_time(&record.latest).ok_or(invalid("latest", "expected HH:MM"))?;
        let interval_minutes =
            parse_interval(&record.interval).map_err(|reason| invalid("interval", reason))?;

        let cfg = Self {
            earliest,
            latest,
            interval_minutes,
            interval_variance: record.interval_variance,
            light_threshold: record.light_threshold,
            volume: record.volume,
            mode: record.mode,
            dark_flash_count: record.dark_flash_count,
            battery_critical_mv: record.battery_critical_mv,
            debug: record.debug,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// The on-disk form of this configuration.
    pub fn to_record(&self) -> ConfigRecord {
        ConfigRecord {
            earliest: format_time(self.earliest),
            latest: format_time(self.latest),
            interval: format_interval(self.interval_minutes),
            light_threshold: self.light_threshold,
            volume: self.volume,
            mode: self.mode,
            debug: self.debug,
            dark_flash_count: self.dark_flash_count,
            interval_variance: self.interval_variance,
            battery_critical_mv: self.battery_critical_mv,
        }
    }
}

/// Textual configuration record as stored and as edited by the setup form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigRecord {
    pub earliest: String,
    pub latest: String,
    /// "H:MM", bare minutes, or empty for off.
    pub interval: String,
    pub light_threshold: u16,
    pub volume: f32,
    pub mode: Mode,
    pub debug: bool,
    pub dark_flash_count: u8,
    pub interval_variance: f32,
    pub battery_critical_mv: u16,
}

impl Default for ConfigRecord {
    fn default() -> Self {
        BirdConfig::default().to_record()
    }
}

fn invalid(field: &'static str, reason: &'static str) -> ConfigError {
    ConfigError::Validation { field, reason }
}

fn valid_volume(v: f32) -> bool {
    v.is_finite() && (0.0..=1.0).contains(&v)
}

fn valid_variance(v: f32) -> bool {
    v.is_finite() && (0.0..=0.5).contains(&v)
}

fn valid_flash_count(n: u8) -> bool {
    (1..=10).contains(&n)
}

fn valid_battery_mv(mv: u16) -> bool {
    mv == 0 || (2500..=4200).contains(&mv)
}

// ═══════════════════════════════════════════════════════════════
//  Text formats
// ═══════════════════════════════════════════════════════════════

/// Parse "HH:MM" (or "H:MM") into a time of day.
pub fn parse_time(s: &str) -> Option<NaiveTime> {
    let (h, m) = s.trim().split_once(':')?;
    if h.is_empty() || h.len() > 2 || m.len() != 2 {
        return None;
    }
    let hour = digits(h)?;
    let minute = digits(m)?;
    if hour > 23 || minute > 59 {
        return None;
    }
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Unsigned decimal with ASCII digits only (no sign, no whitespace).
fn digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

pub fn format_time(t: NaiveTime) -> String {
    format!("{:02}:{:02}", t.hour(), t.minute())
}

/// Parse an interval: "H:MM", bare minutes ("90"), or "" for off.
pub fn parse_interval(s: &str) -> Result<Option<u16>, &'static str> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(None);
    }
    let minutes: u32 = match s.split_once(':') {
        Some((h, m)) => {
            if m.len() != 2 {
                return Err("expected H:MM");
            }
            let hours = digits(h).ok_or("expected H:MM")?;
            let mins = digits(m).ok_or("expected H:MM")?;
            if mins > 59 {
                return Err("minutes must be 00–59");
            }
            hours.saturating_mul(60).saturating_add(mins)
        }
        None => digits(s).ok_or("expected H:MM or minutes")?,
    };
    if minutes == 0 || minutes > u32::from(MAX_INTERVAL_MINUTES) {
        return Err("must be 1–1440 minutes");
    }
    Ok(Some(minutes as u16))
}

pub fn format_interval(minutes: Option<u16>) -> String {
    match minutes {
        Some(m) => format!("{}:{:02}", m / 60, m % 60),
        None => String::new(),
    }
}

// ═══════════════════════════════════════════════════════════════
//  Forgiving decode
// ═══════════════════════════════════════════════════════════════

/// Decode a stored record, substituting defaults field by field.
pub fn decode(bytes: &[u8]) -> BirdConfig {
    let defaults = BirdConfig::default();

    let map = match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            debug!("config: record is not a JSON object, using defaults");
            return defaults;
        }
        Err(e) => {
            debug!("config: record unreadable ({}), using defaults", e);
            return defaults;
        }
    };

    let mut cfg = BirdConfig {
        earliest: field(&map, "earliest", defaults.earliest, |v| {
            v.as_str().and_then(parse_time)
        }),
        latest: field(&map, "latest", defaults.latest, |v| {
            v.as_str().and_then(parse_time)
        }),
        interval_minutes: field(&map, "interval", defaults.interval_minutes, |v| match v {
            Value::String(s) => parse_interval(s).ok(),
            Value::Number(n) => n
                .as_u64()
                .filter(|m| (1..=u64::from(MAX_INTERVAL_MINUTES)).contains(m))
                .map(|m| Some(m as u16)),
            Value::Null => Some(None),
            _ => None,
        }),
        interval_variance: field(&map, "interval_variance", defaults.interval_variance, |v| {
            v.as_f64().map(|x| x as f32).filter(|x| valid_variance(*x))
        }),
        light_threshold: field(&map, "light_threshold", defaults.light_threshold, |v| {
            v.as_u64()
                .filter(|t| *t <= u64::from(LIGHT_ADC_MAX))
                .map(|t| t as u16)
        }),
        volume: field(&map, "volume", defaults.volume, |v| {
            v.as_f64().map(|x| x as f32).filter(|x| valid_volume(*x))
        }),
        mode: field(&map, "mode", defaults.mode, |v| v.as_str().and_then(Mode::parse)),
        dark_flash_count: field(&map, "dark_flash_count", defaults.dark_flash_count, |v| {
            v.as_u64()
                .and_then(|n| u8::try_from(n).ok())
                .filter(|n| valid_flash_count(*n))
        }),
        battery_critical_mv: field(
            &map,
            "battery_critical_mv",
            defaults.battery_critical_mv,
            |v| {
                v.as_u64()
                    .and_then(|n| u16::try_from(n).ok())
                    .filter(|n| valid_battery_mv(*n))
            },
        ),
        debug: field(&map, "debug", defaults.debug, Value::as_bool),
    };

    if cfg.earliest == cfg.latest {
        debug!("config: empty window, using default window");
        cfg.earliest = defaults.earliest;
        cfg.latest = defaults.latest;
    }
    cfg
}

fn field<T>(
    map: &Map<String, Value>,
    name: &str,
    default: T,
    parse: impl FnOnce(&Value) -> Option<T>,
) -> T {
    match map.get(name) {
        Some(v) => parse(v).unwrap_or_else(|| {
            debug!("config: field '{}' invalid ({}), using default", name, v);
            default
        }),
        None => {
            debug!("config: field '{}' missing, using default", name);
            default
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Store access
// ═══════════════════════════════════════════════════════════════

/// Load the configuration from storage.  Never fails.
pub fn load_from<S: StoragePort + ?Sized>(store: &S) -> BirdConfig {
    let mut buf = [0u8; MAX_RECORD_SIZE];
    match store.read(CONFIG_NAMESPACE, CONFIG_KEY, &mut buf) {
        Ok(len) => {
            info!("config: loaded record ({} bytes)", len);
            decode(&buf[..len])
        }
        Err(crate::app::ports::StorageError::NotFound) => {
            info!("config: no stored record, using defaults");
            BirdConfig::default()
        }
        Err(e) => {
            warn!("config: read failed ({}), using defaults", e);
            BirdConfig::default()
        }
    }
}

/// Validate and persist.  On error nothing is written.
pub fn save_to<S: StoragePort + ?Sized>(
    store: &mut S,
    config: &BirdConfig,
) -> Result<(), ConfigError> {
    config.validate()?;
    let bytes = serde_json::to_vec(&config.to_record()).map_err(|_| ConfigError::Corrupted)?;
    if bytes.len() > MAX_RECORD_SIZE {
        return Err(ConfigError::Storage(crate::app::ports::StorageError::Full));
    }
    store.write(CONFIG_NAMESPACE, CONFIG_KEY, &bytes)?;
    info!("config: saved record ({} bytes)", bytes.len());
    Ok(())
}

/// Setup-form entry point: strict parse of the textual record, then save.
pub fn save_record_to<S: StoragePort + ?Sized>(
    store: &mut S,
    record: &ConfigRecord,
) -> Result<BirdConfig, ConfigError> {
    let cfg = BirdConfig::from_record(record)?;
    save_to(store, &cfg)?;
    Ok(cfg)
}

/// Setup-form entry point for a raw JSON body.  Every field is required;
/// a missing or wrong-typed field fails naming that field.
pub fn save_json_to<S: StoragePort + ?Sized>(
    store: &mut S,
    json: &str,
) -> Result<BirdConfig, ConfigError> {
    let map = match serde_json::from_str::<Value>(json) {
        Ok(Value::Object(map)) => map,
        Ok(_) | Err(_) => return Err(ConfigError::Corrupted),
    };

    let record = ConfigRecord {
        earliest: required(&map, "earliest", "expected HH:MM", text)?,
        latest: required(&map, "latest", "expected HH:MM", text)?,
        interval: required(&map, "interval", "expected H:MM or minutes", |v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => n.as_u64().map(|m| m.to_string()),
            _ => None,
        })?,
        light_threshold: required(&map, "light_threshold", "expected 0–4095", |v| {
            v.as_u64().and_then(|n| u16::try_from(n).ok())
        })?,
        volume: required(&map, "volume", "expected a number", |v| {
            v.as_f64().map(|x| x as f32)
        })?,
        mode: required(&map, "mode", "expected clock or random", |v| {
            v.as_str().and_then(Mode::parse)
        })?,
        debug: required(&map, "debug", "expected true or false", Value::as_bool)?,
        dark_flash_count: required(&map, "dark_flash_count", "expected 1–10", |v| {
            v.as_u64().and_then(|n| u8::try_from(n).ok())
        })?,
        interval_variance: required(&map, "interval_variance", "expected a number", |v| {
            v.as_f64().map(|x| x as f32)
        })?,
        battery_critical_mv: required(&map, "battery_critical_mv", "expected millivolts", |v| {
            v.as_u64().and_then(|n| u16::try_from(n).ok())
        })?,
    };
    save_record_to(store, &record)
}

fn text(v: &Value) -> Option<String> {
    v.as_str().map(String::from)
}

fn required<T>(
    map: &Map<String, Value>,
    name: &'static str,
    reason: &'static str,
    parse: impl FnOnce(&Value) -> Option<T>,
) -> Result<T, ConfigError> {
    let value = map.get(name).ok_or(invalid(name, "missing"))?;
    parse(value).ok_or(invalid(name, reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::nvs::NvsAdapter;

    #[test]
    fn default_config_passes_validation() {
        assert!(BirdConfig::default().validate().is_ok());
    }

    #[test]
    fn default_window_is_seven_to_eleven() {
        let c = BirdConfig::default();
        assert_eq!(format_time(c.earliest), "07:00");
        assert_eq!(format_time(c.latest), "23:00");
        assert_eq!(c.interval_minutes, Some(60));
        assert_eq!(c.dark_flash_count, 2);
    }

    #[test]
    fn parse_time_accepts_short_hours() {
        assert_eq!(parse_time("7:05"), Some(hm(7, 5)));
        assert_eq!(parse_time("23:59"), Some(hm(23, 59)));
        assert_eq!(parse_time("24:00"), None);
        assert_eq!(parse_time("12:60"), None);
        assert_eq!(parse_time("1230"), None);
        assert_eq!(parse_time("12:5"), None);
        assert_eq!(parse_time("+7:05"), None);
        assert_eq!(parse_time("7:+5"), None);
        assert_eq!(parse_time("-1:00"), None);
    }

    #[test]
    fn parse_interval_formats() {
        assert_eq!(parse_interval(""), Ok(None));
        assert_eq!(parse_interval("1:00"), Ok(Some(60)));
        assert_eq!(parse_interval("0:15"), Ok(Some(15)));
        assert_eq!(parse_interval("90"), Ok(Some(90)));
        assert!(parse_interval("0:00").is_err());
        assert!(parse_interval("25:00").is_err());
        assert!(parse_interval("1:75").is_err());
        assert!(parse_interval("soon").is_err());
        assert!(parse_interval("+90").is_err());
    }

    #[test]
    fn interval_text_round_trips() {
        assert_eq!(format_interval(Some(90)), "1:30");
        assert_eq!(format_interval(None), "");
        assert_eq!(parse_interval(&format_interval(Some(5))), Ok(Some(5)));
    }

    #[test]
    fn rejects_volume_over_one() {
        let cfg = BirdConfig {
            volume: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Validation { field: "volume", .. })
        ));
    }

    #[test]
    fn rejects_threshold_beyond_adc_range() {
        let cfg = BirdConfig {
            light_threshold: 5000,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Validation {
                field: "light_threshold",
                ..
            })
        ));
    }

    #[test]
    fn rejects_empty_window() {
        let cfg = BirdConfig {
            earliest: hm(8, 0),
            latest: hm(8, 0),
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Validation { field: "latest", .. })
        ));
    }

    #[test]
    fn accepts_wrapping_window() {
        let cfg = BirdConfig {
            earliest: hm(20, 0),
            latest: hm(2, 0),
            ..Default::default()
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn record_with_bad_time_names_the_field() {
        let record = ConfigRecord {
            earliest: "7am".into(),
            ..Default::default()
        };
        assert!(matches!(
            BirdConfig::from_record(&record),
            Err(ConfigError::Validation {
                field: "earliest",
                ..
            })
        ));
    }

    #[test]
    fn decode_corrupt_volume_keeps_other_fields() {
        let json = br#"{"earliest":"06:30","latest":"21:00","interval":"0:30",
            "light_threshold":900,"volume":"loud","mode":"random","debug":true}"#;
        let cfg = decode(json);
        assert!((cfg.volume - BirdConfig::default().volume).abs() < f32::EPSILON);
        assert_eq!(cfg.earliest, hm(6, 30));
        assert_eq!(cfg.latest, hm(21, 0));
        assert_eq!(cfg.interval_minutes, Some(30));
        assert_eq!(cfg.light_threshold, 900);
        assert_eq!(cfg.mode, Mode::Random);
        assert!(cfg.debug);
    }

    #[test]
    fn decode_missing_volume_uses_default() {
        let cfg = decode(br#"{"earliest":"08:00"}"#);
        assert!((cfg.volume - 0.6).abs() < f32::EPSILON);
        assert_eq!(cfg.earliest, hm(8, 0));
    }

    #[test]
    fn decode_out_of_range_volume_uses_default() {
        let cfg = decode(br#"{"volume":3.0}"#);
        assert!((cfg.volume - 0.6).abs() < f32::EPSILON);
    }

    #[test]
    fn decode_empty_interval_means_off() {
        let cfg = decode(br#"{"interval":""}"#);
        assert_eq!(cfg.interval_minutes, None);
    }

    #[test]
    fn decode_garbage_gives_defaults() {
        assert_eq!(decode(b"\xff\x00not json"), BirdConfig::default());
        assert_eq!(decode(b"[1,2,3]"), BirdConfig::default());
    }

    #[test]
    fn decode_empty_window_falls_back_to_default_window() {
        let cfg = decode(br#"{"earliest":"10:00","latest":"10:00","volume":0.2}"#);
        assert_eq!(cfg.window(), BirdConfig::default().window());
        assert!((cfg.volume - 0.2).abs() < f32::EPSILON);
    }

    #[test]
    fn save_then_load_round_trip() {
        let mut nvs = NvsAdapter::new().unwrap();
        let cfg = BirdConfig {
            earliest: hm(9, 15),
            interval_minutes: None,
            mode: Mode::Random,
            volume: 0.25,
            ..Default::default()
        };
        save_to(&mut nvs, &cfg).unwrap();
        assert_eq!(load_from(&nvs), cfg);
    }

    #[test]
    fn failed_save_leaves_store_unchanged() {
        let mut nvs = NvsAdapter::new().unwrap();
        let good = BirdConfig {
            volume: 0.3,
            ..Default::default()
        };
        save_to(&mut nvs, &good).unwrap();

        let bad = BirdConfig {
            volume: -0.1,
            light_threshold: 10,
            ..Default::default()
        };
        assert!(save_to(&mut nvs, &bad).is_err());
        assert_eq!(load_from(&nvs), good);
    }

    #[test]
    fn save_json_requires_every_field() {
        let mut nvs = NvsAdapter::new().unwrap();
        let err = save_json_to(&mut nvs, r#"{"earliest":"07:00"}"#).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Validation {
                field: "latest",
                reason: "missing"
            }
        );
        assert!(!nvs.exists(CONFIG_NAMESPACE, CONFIG_KEY));
    }

    #[test]
    fn save_json_names_wrong_typed_field() {
        let mut nvs = NvsAdapter::new().unwrap();
        save_to(&mut nvs, &BirdConfig::default()).unwrap();
        let body = r#"{"earliest":"06:00","latest":"22:30","interval":"0:45",
            "light_threshold":800,"volume":"loud","mode":"random","debug":false,
            "dark_flash_count":3,"interval_variance":0.25,"battery_critical_mv":0}"#;
        let err = save_json_to(&mut nvs, body).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { field: "volume", .. }));
        assert_eq!(load_from(&nvs), BirdConfig::default());
    }

    #[test]
    fn save_json_rejects_non_object() {
        let mut nvs = NvsAdapter::new().unwrap();
        assert_eq!(save_json_to(&mut nvs, "[1,2]"), Err(ConfigError::Corrupted));
        assert_eq!(save_json_to(&mut nvs, "{nope"), Err(ConfigError::Corrupted));
    }

    #[test]
    fn save_json_accepts_setup_form_body() {
        let mut nvs = NvsAdapter::new().unwrap();
        let body = r#"{"earliest":"06:00","latest":"22:30","interval":"0:45",
            "light_threshold":800,"volume":0.9,"mode":"random","debug":false,
            "dark_flash_count":3,"interval_variance":0.25,"battery_critical_mv":0}"#;
        let cfg = save_json_to(&mut nvs, body).unwrap();
        assert_eq!(cfg.interval_minutes, Some(45));
        assert_eq!(cfg.dark_flash_count, 3);
        assert_eq!(load_from(&nvs), cfg);
    }
}
