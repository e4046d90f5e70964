//! Polarity-aware digital input lines.
//!
//! Each physical line reports its *logical* level ("asserted") regardless
//! of wiring: the AC-sense optocoupler and the flame sensor pull LOW when
//! active, the capacitive water sensor drives HIGH.  Lines are read raw;
//! debouncing happens downstream in the application service.

use embedded_hal::digital::InputPin;
use log::warn;

use crate::error::SensorError;

/// Electrical level that means "asserted".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveLevel {
    High,
    Low,
}

/// A single GPIO input with its polarity.
pub struct DigitalLine<P> {
    pin: P,
    active: ActiveLevel,
    name: &'static str,
    last: bool,
}

impl<P: InputPin> DigitalLine<P> {
    pub fn new(pin: P, active: ActiveLevel, name: &'static str) -> Self {
        Self {
            pin,
            active,
            name,
            last: false,
        }
    }

    /// Read the logical level.  A failed read repeats the previous value,
    /// which the debouncer then treats as "no change".
    pub fn is_asserted(&mut self) -> bool {
        match self.try_read() {
            Ok(level) => self.last = level,
            Err(e) => warn!("{}: {}", self.name, e),
        }
        self.last
    }

    fn try_read(&mut self) -> Result<bool, SensorError> {
        let high = self.pin.is_high().map_err(|_| SensorError::GpioReadFailed)?;
        Ok(match self.active {
            ActiveLevel::High => high,
            ActiveLevel::Low => !high,
        })
    }
}
