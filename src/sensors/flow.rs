//! YF-S201 hall-effect water flow sensor — pulse accumulator.
//!
//! The sensor outputs one pulse per ~2.22 mL of water.  A GPIO ISR calls
//! [`flow_isr_handler`] on each rising edge; the control loop drains the
//! count with a single atomic swap, so a pulse landing mid-drain is
//! attributed to exactly one side of the boundary.

use core::sync::atomic::{AtomicU32, Ordering};

/// Interrupt-fed pulse counter.
///
/// `record_pulse` is the only operation allowed from interrupt context:
/// it never blocks, allocates or logs.  Everything else belongs to the
/// cooperative control loop.
#[derive(Debug)]
pub struct FlowAccumulator {
    pulses: AtomicU32,
}

impl FlowAccumulator {
    pub const fn new() -> Self {
        Self {
            pulses: AtomicU32::new(0),
        }
    }

    /// Count one pulse.  ISR-safe.
    #[inline]
    pub fn record_pulse(&self) {
        self.pulses.fetch_add(1, Ordering::Relaxed);
    }

    /// Read the accumulated count and reset it to zero in one indivisible step.
    pub fn drain(&self) -> u32 {
        self.pulses.swap(0, Ordering::AcqRel)
    }

    /// Discard anything accumulated so far.
    pub fn reset(&self) {
        self.pulses.store(0, Ordering::Release);
    }

    /// Current count without draining (status only).
    pub fn peek(&self) -> u32 {
        self.pulses.load(Ordering::Acquire)
    }
}

impl Default for FlowAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

/// The board's single flow sensor.
/// `static` because ISR callbacks in ESP-IDF cannot capture closures.
pub static FLOW_PULSES: FlowAccumulator = FlowAccumulator::new();

/// Called from the GPIO ISR on each rising edge.
pub fn flow_isr_handler() {
    FLOW_PULSES.record_pulse();
}

/// Convert a drained pulse count over `window_ms` into litres per minute.
///
/// With a 1 s window this is `pulses × 60 / pulses_per_litre`.
pub fn litres_per_minute(pulses: u32, window_ms: u64, pulses_per_litre: f32) -> f32 {
    if window_ms == 0 || pulses_per_litre <= 0.0 {
        return 0.0;
    }
    pulses as f32 * 60_000.0 / (window_ms as f32 * pulses_per_litre)
}
