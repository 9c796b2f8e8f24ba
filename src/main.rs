//! Corvid Firmware — Main Entry Point
//!
//! One wake cycle per boot.  Deep sleep powers the CPU down, so every
//! alarm wake arrives here from the top with empty RAM.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter      LogEventSink   NvsAdapter   Esp32Clock   │
//! │  (Sensor+Eyes+Neck    (EventSink)    (Config+NVS) (ClockPort)  │
//! │   +Speaker+Switch)                                             │
//! │  DeepSleepAlarm (WakeAlarm)                                    │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │          BirdService::run_cycle (pure logic)           │    │
//! │  │  light gate · selector FSM · sequencer · wake planner  │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use log::{error, info, warn};
use rand::SeedableRng;
use rand::rngs::SmallRng;

use corvid::adapters::hardware::HardwareAdapter;
use corvid::adapters::log_sink::LogEventSink;
use corvid::adapters::nvs::NvsAdapter;
use corvid::adapters::sleep::DeepSleepAlarm;
use corvid::adapters::time::Esp32Clock;
use corvid::app::events::AppEvent;
use corvid::app::ports::EventSink;
use corvid::app::service::BirdService;
use corvid::drivers::mode_switch::ModeSwitchDriver;
use corvid::drivers::watchdog::Watchdog;
use corvid::pins;
use corvid::sensors::SensorHub;
use corvid::sensors::battery::BatteryMonitor;
use corvid::sensors::photocell::Photocell;
use corvid::sensors::temperature::TemperatureSensor;

/// This board has the battery divider and the mode switch fitted.
const HAS_BATTERY: bool = true;
const HAS_MODE_SWITCH: bool = true;

// ── Event sink that also feeds the watchdog ───────────────────
//
// The cycle emits an event at every phase boundary, which is exactly
// where the TWDT needs feeding.

struct FeedingSink<'a> {
    log: LogEventSink,
    watchdog: &'a Watchdog,
}

impl EventSink for FeedingSink<'_> {
    fn emit(&mut self, event: &AppEvent) {
        self.watchdog.feed();
        self.log.emit(event);
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("Corvid v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Initialise hardware peripherals ────────────────────
    if let Err(e) = corvid::drivers::hw_init::init_peripherals() {
        // Without peripherals the bird can still keep its schedule;
        // every actuator step will fail and be logged.
        error!("HAL init failed: {}", e);
    }
    let watchdog = Watchdog::default();

    // ── 3. Storage ────────────────────────────────────────────
    let mut nvs = match NvsAdapter::new() {
        Ok(n) => n,
        Err(e) => {
            error!("NVS init failed ({}), restarting", e);
            restart();
        }
    };

    // ── 4. Construct adapters ─────────────────────────────────
    let sensor_hub = SensorHub::new(
        Photocell::new(pins::LIGHT_ADC_GPIO),
        BatteryMonitor::new(HAS_BATTERY),
        TemperatureSensor::new(),
    );
    let mode_switch = ModeSwitchDriver::new(HAS_MODE_SWITCH.then_some(pins::MODE_SWITCH_GPIO));
    let mut hw = HardwareAdapter::new(sensor_hub, mode_switch, FreeRtos);

    let clock = Esp32Clock::new();
    if !clock.is_set() {
        warn!("RTC not set; window checks use 1970-01-01");
    }
    let mut alarm = DeepSleepAlarm::new();
    let mut sink = FeedingSink {
        log: LogEventSink::new(),
        watchdog: &watchdog,
    };

    // ── 5. Run the cycle ──────────────────────────────────────
    let mut service = BirdService::new(SmallRng::seed_from_u64(hardware_seed()));
    match service.run_cycle(&mut hw, &clock, &mut alarm, &mut nvs, &mut sink) {
        Ok(report) => {
            // Only reached if deep sleep returned, which it should not.
            warn!("cycle ended awake (next wake {})", report.next_wake);
            restart();
        }
        Err(e) => {
            error!("cycle failed: {}, restarting", e);
            restart();
        }
    }
}

fn hardware_seed() -> u64 {
    // SAFETY: esp_random reads the hardware RNG register.
    let (hi, lo) = unsafe { (esp_idf_svc::sys::esp_random(), esp_idf_svc::sys::esp_random()) };
    (u64::from(hi) << 32) | u64::from(lo)
}

#[allow(unreachable_code)]
fn restart() -> ! {
    // SAFETY: esp_restart does not return.
    unsafe { esp_idf_svc::sys::esp_restart() };
    loop {}
}
