//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements    | Connects to                     |
//! |------------|---------------|---------------------------------|
//! | `hardware` | InputPort     | GPIO lines, ADC1                |
//! |            | ActuatorPort  | Relay GPIO, LEDC speaker, buzzer|
//! | `log_sink` | EventSink     | Serial log output               |
//! | `time`     | (clock)       | ESP32 high-resolution timer     |

pub mod hardware;
pub mod log_sink;
pub mod time;
