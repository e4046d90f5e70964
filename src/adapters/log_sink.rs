//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART in production).  A push
//! notification or MQTT adapter would implement the same trait.

use log::{error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::fsm::context::LockoutCause;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(state) => {
                info!("START | initial_state={:?}", state);
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            AppEvent::HazardRaised(hazard) => {
                error!("HAZARD | {} | alarm sounding", hazard.label());
            }
            AppEvent::HazardCleared => {
                info!("HAZARD | cleared");
            }
            AppEvent::LockoutEntered(LockoutCause::NoFlowDuringTest { pulses }) => {
                warn!("LOCKOUT | flow test failed, pulses={}", pulses);
            }
            AppEvent::LockoutEntered(LockoutCause::FlowLostWhileRunning) => {
                warn!("LOCKOUT | flow lost while running");
            }
            AppEvent::FlowSample {
                pulses,
                litres_per_min,
            } => {
                info!("FLOW | {:.2} L/min ({} pulses)", litres_per_min, pulses);
            }
            AppEvent::SensorWarmupComplete => {
                info!("SENSORS | gas sensors warmed up");
            }
            AppEvent::Status(s) => {
                info!(
                    "STATUS | pump={:?} | request={} water={} | relay={} | hazard={} | flow={:.2}L/min",
                    s.state,
                    if s.pump_request { "ON" } else { "-" },
                    if s.water_present { "YES" } else { "-" },
                    if s.pump_energized { "ON" } else { "OFF" },
                    s.hazard.label(),
                    s.litres_per_min,
                );
                info!(
                    "SENSORS | {}flame={} lpg={} smoke={}",
                    if s.gas_warmed_up { "" } else { "warming up | " },
                    if s.flame_detected { "YES" } else { "-" },
                    s.lpg_level,
                    s.smoke_level,
                );
            }
        }
    }
}
