//! GPIO / peripheral pin assignments for the KitchenGuard controller board
//! (ESP32-WROOM-32).
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Hazard sensors
// ---------------------------------------------------------------------------

/// IR flame sensor, digital output.  LOW = flame detected.
pub const FLAME_GPIO: i32 = 27;
/// MQ-6 LPG sensor analog output (ADC1 channel 6).
pub const LPG_ADC_GPIO: i32 = 34;
/// MQ-2 smoke sensor analog output (ADC1 channel 7).
pub const SMOKE_ADC_GPIO: i32 = 35;
/// 12 V active buzzer driver, pulsed while any hazard is raised.  Active HIGH.
pub const HAZARD_BUZZER_GPIO: i32 = 14;

// ---------------------------------------------------------------------------
// Pump control
// ---------------------------------------------------------------------------

/// AC voltage detector on the tank float circuit.  LOW = pump requested.
pub const PUMP_REQUEST_GPIO: i32 = 32;
/// Capacitive liquid sensor on the suction pipe (NPN).  HIGH = water present.
pub const WATER_PRESENCE_GPIO: i32 = 13;
/// YF-S201 hall-effect flow sensor — pulse output, interrupt-driven.
pub const FLOW_PULSE_GPIO: i32 = 12;
/// Pump relay coil.  Active HIGH.
pub const PUMP_RELAY_GPIO: i32 = 26;

// ---------------------------------------------------------------------------
// Audio
// ---------------------------------------------------------------------------

/// Passive speaker driven by LEDC at the requested pitch.
pub const SPEAKER_GPIO: i32 = 25;

/// LEDC duty resolution (bits) for the speaker channel.
pub const TONE_RESOLUTION_BITS: u32 = 10;
