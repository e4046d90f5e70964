//! Fuzz target: `AppService` control loop
//!
//! Each input byte pair is one tick: the first byte packs the digital
//! lines and a gas/pulse selector, the second is the time step.  Verifies:
//! - No panics under arbitrary input timelines
//! - The relay is only ever energized in Testing or Running
//! - The pump beep is never audible while a hazard is active
//! - The hazard buzzer is silent whenever no hazard is claimed
//!
//! cargo fuzz run fuzz_control_loop

#![no_main]

use libfuzzer_sys::fuzz_target;

use kitchenguard::app::events::AppEvent;
use kitchenguard::app::ports::{ActuatorPort, EventSink, InputPort, RawInputs};
use kitchenguard::app::service::AppService;
use kitchenguard::audio::ToneCommand;
use kitchenguard::config::SystemConfig;
use kitchenguard::error::Result;
use kitchenguard::hazard::HazardAlarmState;
use kitchenguard::sensors::flow::FlowAccumulator;

static FLOW: FlowAccumulator = FlowAccumulator::new();

#[derive(Default)]
struct Bench {
    inputs: RawInputs,
    pump: bool,
    tone: ToneCommand,
    buzzer: bool,
}

impl InputPort for Bench {
    fn read_inputs(&mut self) -> RawInputs {
        self.inputs
    }
}

impl ActuatorPort for Bench {
    fn set_pump(&mut self, energized: bool) -> Result<()> {
        self.pump = energized;
        Ok(())
    }

    fn set_tone(&mut self, command: ToneCommand) -> Result<()> {
        self.tone = command;
        Ok(())
    }

    fn set_buzzer(&mut self, on: bool) -> Result<()> {
        self.buzzer = on;
        Ok(())
    }

    fn all_off(&mut self) {
        self.pump = false;
        self.tone = ToneCommand::Silence;
        self.buzzer = false;
    }
}

struct Discard;

impl EventSink for Discard {
    fn emit(&mut self, _event: &AppEvent) {}
}

fuzz_target!(|data: &[u8]| {
    let config = SystemConfig {
        startup_delay_ms: 50,
        flow_test_duration_ms: 400,
        lockout_duration_ms: 1_500,
        max_no_flow_duration_ms: 1_000,
        flow_sample_interval_ms: 1_000,
        sensor_warmup_ms: 200,
        ..SystemConfig::default()
    };
    FLOW.reset();
    let mut app = AppService::new(config, &FLOW);
    let mut bench = Bench::default();
    app.start(&mut bench, &mut Discard, 0);

    let mut now = 0u64;
    for chunk in data.chunks_exact(2) {
        let (bits, step) = (chunk[0], chunk[1]);
        bench.inputs.pump_request = bits & 0x01 != 0;
        bench.inputs.water_present = bits & 0x02 != 0;
        bench.inputs.flame_detected = bits & 0x04 != 0;
        match bits >> 6 {
            0 => bench.inputs.lpg_level = u16::from(bits & 0x38) << 6,
            1 => bench.inputs.smoke_level = u16::from(bits & 0x38) << 6,
            _ => (0..(bits & 0x38) >> 3).for_each(|_| FLOW.record_pulse()),
        }

        now += u64::from(step);
        app.tick(&mut bench, &mut Discard, now);

        assert!(
            !bench.pump || app.state().permits_pump(),
            "relay energized in {:?}",
            app.state()
        );
        if app.hazard() != HazardAlarmState::Off {
            assert!(!matches!(bench.tone, ToneCommand::Pulsed(_)));
        } else {
            assert!(!bench.buzzer);
        }
    }
});
