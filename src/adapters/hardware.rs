//! Hardware adapter — bridges real peripherals to domain port traits.
//!
//! Owns the [`SensorHub`], the pump relay and the tone driver (speaker
//! and hazard buzzer), exposing them through [`InputPort`] and
//! [`ActuatorPort`].  This is the only module in the system that touches
//! actual hardware.  Digital lines are
//! generic over `embedded-hal` pins so host tests can plug in doubles; on
//! non-espidf targets the ADC and LEDC paths use cfg-gated stubs.

use embedded_hal::digital::{InputPin, OutputPin};
use log::warn;

use crate::app::ports::{ActuatorPort, InputPort, RawInputs};
use crate::audio::ToneCommand;
use crate::drivers::pump::PumpRelay;
use crate::drivers::tone::ToneDriver;
use crate::error::Result;
use crate::sensors::SensorHub;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<P, O> {
    sensor_hub: SensorHub<P>,
    relay: PumpRelay<O>,
    tone: ToneDriver,
}

impl<P: InputPin, O: OutputPin> HardwareAdapter<P, O> {
    pub fn new(sensor_hub: SensorHub<P>, relay: PumpRelay<O>, tone: ToneDriver) -> Self {
        Self {
            sensor_hub,
            relay,
            tone,
        }
    }

    pub fn relay(&self) -> &PumpRelay<O> {
        &self.relay
    }

    pub fn tone(&self) -> ToneCommand {
        self.tone.current()
    }

    pub fn buzzer_on(&self) -> bool {
        self.tone.buzzer_on()
    }
}

// ── InputPort implementation ──────────────────────────────────

impl<P: InputPin, O: OutputPin> InputPort for HardwareAdapter<P, O> {
    fn read_inputs(&mut self) -> RawInputs {
        self.sensor_hub.read_all()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<P: InputPin, O: OutputPin> ActuatorPort for HardwareAdapter<P, O> {
    fn set_pump(&mut self, energized: bool) -> Result<()> {
        self.relay.set(energized)
    }

    fn set_tone(&mut self, command: ToneCommand) -> Result<()> {
        self.tone.apply(command)
    }

    fn set_buzzer(&mut self, on: bool) -> Result<()> {
        self.tone.set_buzzer(on)
    }

    fn all_off(&mut self) {
        if let Err(e) = self.relay.set(false) {
            warn!("all_off: relay release failed: {}", e);
        }
        self.tone.silence();
    }
}
