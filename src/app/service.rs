//! Application service — the hexagonal core.
//!
//! [`AppService`] owns the debouncers, the hazard arbitrator, the pump FSM
//! and the intermittent alarm.  It exposes a clean, hardware-agnostic API.
//! All I/O flows through port traits injected at call sites, and the clock
//! is a plain `now_ms` argument, so the whole service is testable with
//! mock adapters and a synthetic timeline.
//!
//! ```text
//!   InputPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                 │          AppService          │
//! ActuatorPort ◀──│ debounce · hazard · FSM · 🔊 │
//!                 └──────────────────────────────┘
//!        FlowAccumulator (ISR) ──▶ FSM
//! ```
//!
//! ## Tick order
//!
//! 1. Read raw inputs, debounce the three digital lines.
//! 2. Hazard arbitrator (warm-up gate, then classification).
//! 3. Pump FSM on the debounced request/water lines.
//! 4. Intermittent alarm render, suppressed by any active hazard.
//! 5. Tone arbitration and the hazard buzzer cadence.
//! 6. Actuators: relay every tick, tone and buzzer only when they change.
//! 7. Events, after the outputs are already applied.

use log::{info, warn};

use crate::audio::{HazardBuzzer, IntermittentAlarm, ToneCommand, arbitrate};
use crate::config::SystemConfig;
use crate::fsm::context::{FsmContext, PumpInputs};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};
use crate::hazard::{HazardAlarmState, HazardArbitrator, HazardReadings, HazardTransition};
use crate::sensors::debounce::DigitalSignal;
use crate::sensors::flow::FlowAccumulator;

use super::events::{AppEvent, StatusReport};
use super::ports::{ActuatorPort, EventSink, InputPort};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    fsm: Fsm,
    ctx: FsmContext,
    hazard: HazardArbitrator,
    alarm: IntermittentAlarm,
    buzzer: HazardBuzzer,
    /// Hazard inputs from the latest tick, for status reports.
    readings: HazardReadings,
    pump_request: DigitalSignal,
    water_presence: DigitalSignal,
    flame: DigitalSignal,
    /// Last command the tone port accepted.  `None` forces a write.
    applied_tone: Option<ToneCommand>,
    /// Last buzzer level the port accepted.  `None` forces a write.
    applied_buzzer: Option<bool>,
    last_status_ms: u64,
    tick_count: u64,
}

impl AppService {
    /// Construct the service from configuration and the ISR-fed pulse
    /// counter.
    ///
    /// Does **not** start the FSM; call [`start`](Self::start) next.
    pub fn new(config: SystemConfig, flow: &'static FlowAccumulator) -> Self {
        let debounce = config.debounce_ms;
        let hazard = HazardArbitrator::new(&config);
        let alarm = IntermittentAlarm::new(&config);
        let buzzer = HazardBuzzer::new(&config);
        let ctx = FsmContext::new(config, flow);
        let fsm = Fsm::new(build_state_table(), StateId::Startup);

        Self {
            fsm,
            ctx,
            hazard,
            alarm,
            buzzer,
            readings: HazardReadings::default(),
            pump_request: DigitalSignal::new(false, debounce),
            water_presence: DigitalSignal::new(false, debounce),
            flame: DigitalSignal::new(false, debounce),
            applied_tone: None,
            applied_buzzer: None,
            last_status_ms: 0,
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Put every output in a known-safe state and enter Startup.
    pub fn start(&mut self, hw: &mut impl ActuatorPort, sink: &mut impl EventSink, now_ms: u64) {
        hw.all_off();
        self.applied_tone = Some(ToneCommand::Silence);
        self.applied_buzzer = Some(false);
        self.ctx.now_ms = now_ms;
        self.last_status_ms = now_ms;
        self.hazard.start(now_ms);
        self.fsm.start(&mut self.ctx);
        sink.emit(&AppEvent::Started(self.fsm.current_state()));
        info!("AppService started in {:?}", self.fsm.current_state());
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one full control cycle at `now_ms`.
    ///
    /// The `hw` parameter satisfies **both** [`InputPort`] and
    /// [`ActuatorPort`]; this avoids a double mutable borrow while
    /// keeping the port boundary explicit.
    pub fn tick(
        &mut self,
        hw: &mut (impl InputPort + ActuatorPort),
        sink: &mut impl EventSink,
        now_ms: u64,
    ) {
        self.tick_count += 1;

        // 1. Inputs
        let raw = hw.read_inputs();
        let inputs = PumpInputs {
            pump_request: self.pump_request.update(raw.pump_request, now_ms),
            water_present: self.water_presence.update(raw.water_present, now_ms),
        };
        let flame_detected = self.flame.update(raw.flame_detected, now_ms);

        // 2. Hazard arbitration
        let warmed_up = self.hazard.poll_warmup(now_ms);
        self.readings = HazardReadings {
            flame_detected,
            lpg_level: raw.lpg_level,
            smoke_level: raw.smoke_level,
        };
        let hazard_edge = self.hazard.evaluate(&self.readings, now_ms);
        let hazard = self.hazard.state();

        // 3. Pump FSM
        let prev_state = self.fsm.current_state();
        self.ctx.now_ms = now_ms;
        self.ctx.inputs = inputs;
        self.ctx.events.clear();
        self.fsm.tick(&mut self.ctx);
        let state = self.fsm.current_state();

        // 4–5. Audio
        self.alarm.set_active(self.ctx.commands.intermittent_alarm);
        let beep_on = self.alarm.render(now_ms, hazard);
        let tone = arbitrate(hazard, beep_on, &self.ctx.config);
        let buzzer_on = self.buzzer.render(now_ms, hazard);

        // 6. Outputs before any event is published
        self.apply_actuators(hw, tone, buzzer_on);

        // 7. Events
        if warmed_up {
            sink.emit(&AppEvent::SensorWarmupComplete);
        }
        match hazard_edge {
            Some(HazardTransition::Raised(s)) => sink.emit(&AppEvent::HazardRaised(s)),
            Some(HazardTransition::Cleared) => sink.emit(&AppEvent::HazardCleared),
            None => {}
        }
        for event in self.ctx.events.iter() {
            sink.emit(event);
        }
        if state != prev_state {
            sink.emit(&AppEvent::StateChanged {
                from: prev_state,
                to: state,
            });
        }
        if now_ms.saturating_sub(self.last_status_ms) >= self.ctx.config.status_interval_ms {
            self.last_status_ms = now_ms;
            sink.emit(&AppEvent::Status(self.status_report()));
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Build a status snapshot from the current context.
    pub fn status_report(&self) -> StatusReport {
        let state = self.fsm.current_state();
        StatusReport {
            state,
            pump_request: self.ctx.inputs.pump_request,
            water_present: self.ctx.inputs.water_present,
            pump_energized: self.ctx.commands.pump_energized,
            hazard: self.hazard.state(),
            litres_per_min: if state == StateId::Running {
                self.ctx.last_flow.litres_per_min
            } else {
                0.0
            },
            flame_detected: self.readings.flame_detected,
            lpg_level: self.readings.lpg_level,
            smoke_level: self.readings.smoke_level,
            gas_warmed_up: self.hazard.is_warmed_up(),
        }
    }

    /// Current FSM state.
    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    /// Current hazard classification.
    pub fn hazard(&self) -> HazardAlarmState {
        self.hazard.state()
    }

    /// Whether the FSM is commanding the relay on.
    pub fn pump_energized(&self) -> bool {
        self.ctx.commands.pump_energized
    }

    /// Whether the FSM is requesting the "needs attention" beep.
    pub fn intermittent_alarm_active(&self) -> bool {
        self.alarm.is_active()
    }

    /// Last tone command accepted by the actuator port.
    pub fn applied_tone(&self) -> Option<ToneCommand> {
        self.applied_tone
    }

    /// Last hazard buzzer level accepted by the actuator port.
    pub fn applied_buzzer(&self) -> Option<bool> {
        self.applied_buzzer
    }

    /// Total control ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// The live configuration.
    pub fn config(&self) -> &SystemConfig {
        &self.ctx.config
    }

    // ── Internal ──────────────────────────────────────────────

    /// Translate FSM and arbitration results into port calls.
    ///
    /// Failures are logged and retried next tick; the loop never stops.
    fn apply_actuators(&mut self, hw: &mut impl ActuatorPort, tone: ToneCommand, buzzer_on: bool) {
        if let Err(e) = hw.set_pump(self.ctx.commands.pump_energized) {
            warn!("pump relay write failed: {}", e);
        }

        if self.applied_tone != Some(tone) {
            match hw.set_tone(tone) {
                Ok(()) => self.applied_tone = Some(tone),
                Err(e) => {
                    warn!("tone output write failed: {}", e);
                    self.applied_tone = None;
                }
            }
        }

        if self.applied_buzzer != Some(buzzer_on) {
            match hw.set_buzzer(buzzer_on) {
                Ok(()) => self.applied_buzzer = Some(buzzer_on),
                Err(e) => {
                    warn!("hazard buzzer write failed: {}", e);
                    self.applied_buzzer = None;
                }
            }
        }
    }
}
