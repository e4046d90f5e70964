//! Shared tone output: LEDC speaker plus the hazard buzzer.
//!
//! The speaker plays whatever [`ToneCommand`] the service arbitrated.  The
//! 12 V buzzer is a separate line the service pulses on its own cadence
//! while a hazard is claimed.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives LEDC and GPIO via hw_init helpers.
//! On host/test: hw_init stubs succeed unless a fault is injected with
//! `hw_init::sim_set_audio_fault`; state is tracked in-memory.

use log::warn;

use crate::audio::ToneCommand;
use crate::drivers::hw_init;
use crate::error::Error;

pub struct ToneDriver {
    current: ToneCommand,
    buzzer_on: bool,
}

impl Default for ToneDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl ToneDriver {
    pub fn new() -> Self {
        Self {
            current: ToneCommand::Silence,
            buzzer_on: false,
        }
    }

    /// Drive the speaker.
    pub fn apply(&mut self, command: ToneCommand) -> Result<(), Error> {
        match command {
            ToneCommand::Silence => hw_init::tone_stop()?,
            ToneCommand::Continuous(hz) | ToneCommand::Pulsed(hz) => hw_init::tone_start(hz)?,
        }
        self.current = command;
        Ok(())
    }

    /// Drive the hazard buzzer line.
    pub fn set_buzzer(&mut self, on: bool) -> Result<(), Error> {
        hw_init::buzzer_write(on)?;
        self.buzzer_on = on;
        Ok(())
    }

    /// Stop both outputs.  Failures are logged, never returned.
    pub fn silence(&mut self) {
        if let Err(e) = hw_init::tone_stop() {
            warn!("silence: speaker stop failed: {}", e);
        }
        if let Err(e) = hw_init::buzzer_write(false) {
            warn!("silence: buzzer release failed: {}", e);
        }
        self.current = ToneCommand::Silence;
        self.buzzer_on = false;
    }

    pub fn current(&self) -> ToneCommand {
        self.current
    }

    pub fn buzzer_on(&self) -> bool {
        self.buzzer_on
    }
}
