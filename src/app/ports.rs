//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (input lines, relay, speaker, event sinks) implement these
//! traits.  The [`AppService`](super::service::AppService) consumes them via
//! generics, so the domain core never touches hardware directly.
//!
//! The flow-sensor pulse source is deliberately *not* a port: it is an
//! interrupt feeding a [`FlowAccumulator`](crate::sensors::flow::FlowAccumulator)
//! handed to the service at construction.

use serde::{Deserialize, Serialize};

use crate::audio::ToneCommand;
use crate::error::Result;

use super::events::AppEvent;

// ───────────────────────────────────────────────────────────────
// Input port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// One raw sample of every polled input.  Digital lines carry their
/// logical level (polarity already applied); nothing is debounced yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawInputs {
    pub pump_request: bool,
    pub water_present: bool,
    pub flame_detected: bool,
    /// Raw 12-bit ADC counts from the LPG sensor.
    pub lpg_level: u16,
    /// Raw 12-bit ADC counts from the smoke sensor.
    pub smoke_level: u16,
}

/// Read-side port: the domain calls this once per tick.
pub trait InputPort {
    fn read_inputs(&mut self) -> RawInputs;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to command actuators.
pub trait ActuatorPort {
    /// Energize (`true`) or release the pump relay.
    fn set_pump(&mut self, energized: bool) -> Result<()>;

    /// Drive the shared tone output.
    fn set_tone(&mut self, command: ToneCommand) -> Result<()>;

    /// Drive the 12 V hazard buzzer line.
    fn set_buzzer(&mut self, on: bool) -> Result<()>;

    /// Relay released, speaker and buzzer silent.  Best effort; never fails.
    fn all_off(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / notification)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`]s through this port.
/// Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}

/// Fan-out: a pair of sinks both receive every event.
impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn emit(&mut self, event: &AppEvent) {
        self.0.emit(event);
        self.1.emit(event);
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn emit(&mut self, event: &AppEvent) {
        (**self).emit(event);
    }
}
