//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the single struct that pump state handlers read from and
//! write to.  It carries the debounced inputs, the pump/alarm commands, the
//! injected clock, the flow accumulator handle and the no-flow watchdog.
//! Think of it as the "blackboard" in a blackboard architecture.

use heapless::Vec;
use serde::{Deserialize, Serialize};

use crate::app::events::AppEvent;
use crate::config::SystemConfig;
use crate::sensors::flow::FlowAccumulator;

/// Events a single tick can queue.  One state transition produces at most a
/// lockout plus a flow sample, so this never fills in practice.
pub const MAX_FSM_EVENTS: usize = 4;

// ---------------------------------------------------------------------------
// Inputs (written by the service after debouncing)
// ---------------------------------------------------------------------------

/// Debounced pump-side inputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpInputs {
    /// Mains sense on the pump's request line.
    pub pump_request: bool,
    /// Water detected in the supply pipe.
    pub water_present: bool,
}

// ---------------------------------------------------------------------------
// Commands (written by state handlers; consumed by the service)
// ---------------------------------------------------------------------------

/// Requests the pump FSM makes of the outside world.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpCommands {
    /// Relay energized.
    pub pump_energized: bool,
    /// "Needs attention" beep requested.
    pub intermittent_alarm: bool,
}

impl PumpCommands {
    /// Pump off, alarm off.
    pub fn all_off() -> Self {
        Self::default()
    }
}

/// Why the pump was locked out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockoutCause {
    /// The verification window closed with too few pulses.
    NoFlowDuringTest { pulses: u32 },
    /// Flow stopped for longer than the tolerated gap while running.
    FlowLostWhileRunning,
}

/// Last drained flow sample.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlowReading {
    pub pulses: u32,
    pub litres_per_min: f32,
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct FsmContext {
    // -- Timing --
    /// Monotonic clock for the current tick (ms since boot).
    pub now_ms: u64,
    /// Milliseconds since the current state was entered.
    pub ms_in_state: u64,

    // -- Inputs --
    pub inputs: PumpInputs,
    /// Pulse counter fed by the flow-sensor ISR.
    pub flow: &'static FlowAccumulator,

    // -- Outputs --
    pub commands: PumpCommands,
    /// Queued for the event sink; drained by the service every tick.
    pub events: Vec<AppEvent, MAX_FSM_EVENTS>,

    // -- Running bookkeeping --
    /// Start of the current zero-flow stretch while Running.
    pub no_flow_since: Option<u64>,
    /// Start of the current flow sampling window.
    pub sample_window_start_ms: u64,
    pub last_flow: FlowReading,

    /// System configuration (tunable parameters).
    pub config: SystemConfig,
}

impl FsmContext {
    /// Create a new context with the given configuration and pulse source.
    pub fn new(config: SystemConfig, flow: &'static FlowAccumulator) -> Self {
        Self {
            now_ms: 0,
            ms_in_state: 0,
            inputs: PumpInputs::default(),
            flow,
            commands: PumpCommands::all_off(),
            events: Vec::new(),
            no_flow_since: None,
            sample_window_start_ms: 0,
            last_flow: FlowReading::default(),
            config,
        }
    }

    /// Water pre-check.  A disabled check always reports water present.
    pub fn water_ok(&self) -> bool {
        !self.config.water_presence_check_enabled || self.inputs.water_present
    }

    /// Queue an event for the sink.  Overflow drops the event with a warning
    /// rather than stalling the control loop.
    pub fn push_event(&mut self, event: AppEvent) {
        if let Err(dropped) = self.events.push(event) {
            log::warn!("FSM event queue full; dropped {:?}", dropped);
        }
    }
}
