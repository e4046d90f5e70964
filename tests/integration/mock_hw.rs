//! Mock hardware adapter for integration tests.
//!
//! Records every actuator call so tests can assert on the full command
//! history without touching real GPIO/LEDC registers.  Inputs are plain
//! fields the test flips between ticks.

use kitchenguard::app::events::AppEvent;
use kitchenguard::app::ports::{ActuatorPort, EventSink, InputPort, RawInputs};
use kitchenguard::app::service::AppService;
use kitchenguard::audio::ToneCommand;
use kitchenguard::config::SystemConfig;
use kitchenguard::error::{ActuatorError, Result};
use kitchenguard::fsm::StateId;
use kitchenguard::sensors::flow::FlowAccumulator;

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActuatorCall {
    SetPump(bool),
    SetTone(ToneCommand),
    SetBuzzer(bool),
    AllOff,
}

// ── MockHardware ──────────────────────────────────────────────

#[derive(Default)]
pub struct MockHardware {
    pub inputs: RawInputs,
    pub calls: Vec<ActuatorCall>,
    pub fail_pump_writes: bool,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self::default()
    }

    /// Relay level after the most recent successful write.
    pub fn pump_on(&self) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                ActuatorCall::SetPump(on) => Some(*on),
                ActuatorCall::AllOff => Some(false),
                _ => None,
            })
            .unwrap_or(false)
    }

    /// Tone output after the most recent write.
    pub fn tone(&self) -> ToneCommand {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                ActuatorCall::SetTone(t) => Some(*t),
                ActuatorCall::AllOff => Some(ToneCommand::Silence),
                _ => None,
            })
            .unwrap_or(ToneCommand::Silence)
    }

    /// Hazard buzzer level after the most recent write.
    pub fn buzzer_on(&self) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                ActuatorCall::SetBuzzer(on) => Some(*on),
                ActuatorCall::AllOff => Some(false),
                _ => None,
            })
            .unwrap_or(false)
    }

    pub fn tone_writes(&self) -> Vec<ToneCommand> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ActuatorCall::SetTone(t) => Some(*t),
                _ => None,
            })
            .collect()
    }
}

impl InputPort for MockHardware {
    fn read_inputs(&mut self) -> RawInputs {
        self.inputs
    }
}

impl ActuatorPort for MockHardware {
    fn set_pump(&mut self, energized: bool) -> Result<()> {
        if self.fail_pump_writes {
            return Err(ActuatorError::GpioWriteFailed.into());
        }
        self.calls.push(ActuatorCall::SetPump(energized));
        Ok(())
    }

    fn set_tone(&mut self, command: ToneCommand) -> Result<()> {
        self.calls.push(ActuatorCall::SetTone(command));
        Ok(())
    }

    fn set_buzzer(&mut self, on: bool) -> Result<()> {
        self.calls.push(ActuatorCall::SetBuzzer(on));
        Ok(())
    }

    fn all_off(&mut self) {
        self.calls.push(ActuatorCall::AllOff);
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<(u64, AppEvent)>,
    pub now_ms: u64,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn transitions(&self) -> Vec<(u64, StateId, StateId)> {
        self.events
            .iter()
            .filter_map(|(t, e)| match e {
                AppEvent::StateChanged { from, to } => Some((*t, *from, *to)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|(_, e)| pred(e)).count()
    }

    /// Timestamp of the first entry into `state`.
    pub fn entered_at(&self, state: StateId) -> Option<u64> {
        self.transitions()
            .into_iter()
            .find(|(_, _, to)| *to == state)
            .map(|(t, _, _)| t)
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push((self.now_ms, *event));
    }
}

// ── Rig: service + mocks + synthetic clock ────────────────────

pub const STEP_MS: u64 = 10;

pub struct Rig {
    pub app: AppService,
    pub hw: MockHardware,
    pub sink: RecordingSink,
    pub flow: &'static FlowAccumulator,
    pub now_ms: u64,
}

#[allow(dead_code)]
impl Rig {
    pub fn new(config: SystemConfig) -> Self {
        Self::started_at(config, 0)
    }

    /// Service started at `t0`, as when the monotonic clock already ran
    /// through the bootloader and peripheral init.
    pub fn started_at(config: SystemConfig, t0: u64) -> Self {
        let flow: &'static FlowAccumulator = Box::leak(Box::new(FlowAccumulator::new()));
        let mut app = AppService::new(config, flow);
        let mut hw = MockHardware::new();
        let mut sink = RecordingSink {
            now_ms: t0,
            ..RecordingSink::default()
        };
        app.start(&mut hw, &mut sink, t0);
        Self {
            app,
            hw,
            sink,
            flow,
            now_ms: t0,
        }
    }

    /// Default config, already through Startup and sitting in Idle.
    pub fn idle() -> Self {
        let mut rig = Self::new(SystemConfig::default());
        let delay = rig.app.config().startup_delay_ms;
        rig.run_until(delay);
        assert_eq!(rig.app.state(), StateId::Idle);
        rig
    }

    pub fn tick(&mut self) {
        self.sink.now_ms = self.now_ms;
        self.app.tick(&mut self.hw, &mut self.sink, self.now_ms);
    }

    /// Tick every [`STEP_MS`] until the clock reads `t` (inclusive).
    pub fn run_until(&mut self, t: u64) {
        while self.now_ms < t {
            self.now_ms = (self.now_ms + STEP_MS).min(t);
            self.tick();
        }
    }

    /// Like `run_until`, checking `check` after every tick.
    pub fn run_until_checking(&mut self, t: u64, mut check: impl FnMut(&Self)) {
        while self.now_ms < t {
            self.now_ms = (self.now_ms + STEP_MS).min(t);
            self.tick();
            check(self);
        }
    }

    pub fn pulses(&self, n: u32) {
        for _ in 0..n {
            self.flow.record_pulse();
        }
    }

    pub fn debounce_ms(&self) -> u64 {
        self.app.config().debounce_ms
    }
}
