//! GPIO / peripheral pin assignments for the bird controller board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Eyes (two LEDs in parallel behind 200 Ω, low-side MOSFET)
// ---------------------------------------------------------------------------

/// LEDC PWM output for eye brightness.
pub const EYES_PWM_GPIO: i32 = 1;

// ---------------------------------------------------------------------------
// Neck servo (SG90 micro servo, 5 V supply)
// ---------------------------------------------------------------------------

/// LEDC PWM output for the neck servo signal line.
pub const NECK_SERVO_GPIO: i32 = 2;

// ---------------------------------------------------------------------------
// Speaker (MAX98357-style class-D amplifier)
// ---------------------------------------------------------------------------

/// LEDC PWM output driving the amplifier input.
pub const SPEAKER_PWM_GPIO: i32 = 3;
/// Digital output: amplifier shutdown pin (HIGH = enabled).
pub const AMP_ENABLE_GPIO: i32 = 4;

// ---------------------------------------------------------------------------
// Sensors — Analog (ADC1)
// ---------------------------------------------------------------------------

/// Photocell in a divider with a 10 kΩ resistor; brighter = higher reading.
/// ADC1 channel 4 (GPIO 5 on ESP32-S3).
pub const LIGHT_ADC_GPIO: i32 = 5;

/// Battery tap through a 2:1 divider.
/// ADC1 channel 5 (GPIO 6 on ESP32-S3).
pub const BATTERY_ADC_GPIO: i32 = 6;

// ---------------------------------------------------------------------------
// Mode switch (SPDT slide switch with internal pull-up)
// ---------------------------------------------------------------------------

/// Digital input: HIGH = Clock mode, LOW = Random mode.
pub const MODE_SWITCH_GPIO: i32 = 7;

// ---------------------------------------------------------------------------
// UART debug
// ---------------------------------------------------------------------------

pub const UART_TX_GPIO: i32 = 43;
pub const UART_RX_GPIO: i32 = 44;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// Eye LED PWM frequency (5 kHz, flicker-free on camera).
pub const EYES_PWM_FREQ_HZ: u32 = 5_000;
/// Standard hobby-servo frame rate.
pub const SERVO_PWM_FREQ_HZ: u32 = 50;
/// Servo timer resolution; 14 bits at 50 Hz gives ~1.2 µs steps.
pub const SERVO_RESOLUTION_BITS: u32 = 14;
/// Initial speaker tone frequency; changed per note at runtime.
pub const SPEAKER_BASE_FREQ_HZ: u32 = 2_000;
