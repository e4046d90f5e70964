//! Pump relay driver.
//!
//! A single relay coil on a GPIO, switched through the `embedded-hal`
//! [`OutputPin`] trait so the same driver runs on an ESP-IDF `PinDriver`
//! and on a host test double.
//!
//! ## Safety contract
//!
//! The relay is driven to its released level at construction, before the
//! control loop has made any decision.  Whether the pump *may* run is the
//! pump FSM's business; this driver is a dumb actuator.

use embedded_hal::digital::OutputPin;
use log::info;

use crate::error::{ActuatorError, Error};
use crate::sensors::lines::ActiveLevel;

pub struct PumpRelay<O> {
    pin: O,
    active: ActiveLevel,
    energized: bool,
}

impl<O: OutputPin> PumpRelay<O> {
    /// Take ownership of the relay pin and release the coil.
    pub fn new(pin: O, active: ActiveLevel) -> Result<Self, Error> {
        let mut relay = Self {
            pin,
            active,
            energized: true,
        };
        relay.set(false)?;
        Ok(relay)
    }

    /// Energize or release the coil.  Idempotent.
    pub fn set(&mut self, energized: bool) -> Result<(), Error> {
        let high = match self.active {
            ActiveLevel::High => energized,
            ActiveLevel::Low => !energized,
        };
        self.pin
            .set_state(high.into())
            .map_err(|_| ActuatorError::GpioWriteFailed)?;

        if energized != self.energized {
            info!("pump relay {}", if energized { "ON" } else { "OFF" });
        }
        self.energized = energized;
        Ok(())
    }

    pub fn is_energized(&self) -> bool {
        self.energized
    }
}
