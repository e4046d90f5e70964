//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to serial, sound a remote
//! buzzer, push a notification.  Formatting is never done here.

use serde::Serialize;

use crate::fsm::StateId;
use crate::fsm::context::LockoutCause;
use crate::hazard::HazardAlarmState;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum AppEvent {
    /// The application service has started (carries initial state).
    Started(StateId),

    /// The pump FSM transitioned between states.
    StateChanged { from: StateId, to: StateId },

    /// A hazard was detected, or the active hazard changed.
    HazardRaised(HazardAlarmState),

    /// The kitchen is clear again.
    HazardCleared,

    /// The pump has been de-energized and locked out.
    LockoutEntered(LockoutCause),

    /// One flow sampling window closed while Running.
    FlowSample { pulses: u32, litres_per_min: f32 },

    /// Gas and smoke readings are now trusted.
    SensorWarmupComplete,

    /// Periodic status snapshot.
    Status(StatusReport),
}

/// A point-in-time status snapshot suitable for logging or transmission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatusReport {
    pub state: StateId,
    pub pump_request: bool,
    pub water_present: bool,
    pub pump_energized: bool,
    pub hazard: HazardAlarmState,
    /// Rate from the most recent sample; zero outside Running.
    pub litres_per_min: f32,
    /// Debounced flame line.
    pub flame_detected: bool,
    /// Raw LPG ADC counts, reported during warm-up too for calibration.
    pub lpg_level: u16,
    /// Raw smoke ADC counts.
    pub smoke_level: u16,
    /// Whether the gas readings are already trusted by the arbitrator.
    pub gas_warmed_up: bool,
}
