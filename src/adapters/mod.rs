//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter      | Implements         | Connects to                   |
//! |--------------|--------------------|-------------------------------|
//! | `hardware`   | SensorPort         | ESP32 ADC                     |
//! |              | Eyes, Neck         | ESP32 LEDC PWM                |
//! |              | Speaker            | LEDC tone + amp enable GPIO   |
//! |              | ModeSwitch         | GPIO input                    |
//! | `log_sink`   | EventSink          | Serial log output             |
//! | `nvs`        | ConfigPort         | NVS / in-memory store         |
//! |              | StoragePort        |                               |
//! | `sleep`      | WakeAlarm          | RTC timer + deep sleep        |
//! | `time`       | ClockPort          | RTC wall clock, esp_timer     |

pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod sleep;
pub mod time;
