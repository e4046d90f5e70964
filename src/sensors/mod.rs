//! Sensor subsystem — individual drivers and the aggregating [`SensorHub`].
//!
//! The hub owns every input and produces a [`RawInputs`] sample each tick.
//! Nothing here debounces or interprets; that is the application
//! service's job.  The flow sensor is the exception: it is fed from an
//! ISR and drained by the pump state machine, never sampled here.

pub mod debounce;
pub mod flow;
pub mod gas;
pub mod lines;

use embedded_hal::digital::InputPin;

use crate::app::ports::RawInputs;
use gas::GasSensor;
use lines::DigitalLine;

/// Aggregates all polled inputs.
pub struct SensorHub<P> {
    pub pump_request: DigitalLine<P>,
    pub water_presence: DigitalLine<P>,
    pub flame: DigitalLine<P>,
    pub lpg: GasSensor,
    pub smoke: GasSensor,
}

impl<P: InputPin> SensorHub<P> {
    /// Construct a new hub.  Pass in pre-built lines (built in main
    /// where peripheral ownership is established).
    pub fn new(
        pump_request: DigitalLine<P>,
        water_presence: DigitalLine<P>,
        flame: DigitalLine<P>,
        lpg: GasSensor,
        smoke: GasSensor,
    ) -> Self {
        Self {
            pump_request,
            water_presence,
            flame,
            lpg,
            smoke,
        }
    }

    /// Read every input once.
    ///
    /// Individual read failures are logged by the line and the previous
    /// value is retained.
    pub fn read_all(&mut self) -> RawInputs {
        RawInputs {
            pump_request: self.pump_request.is_asserted(),
            water_present: self.water_presence.is_asserted(),
            flame_detected: self.flame.is_asserted(),
            lpg_level: self.lpg.read(),
            smoke_level: self.smoke.read(),
        }
    }
}
