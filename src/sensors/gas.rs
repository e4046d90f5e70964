//! MQ-6 (LPG) and MQ-2 (smoke) analog gas sensors.
//!
//! Both sensors are read as raw 12-bit ADC counts; the thresholds in
//! [`SystemConfig`](crate::config::SystemConfig) are expressed in the same
//! unit, so no calibration curve is applied here.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads ADC1 via the oneshot API (initialised by hw_init).
//! On host/test: reads from static atomics for injection.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU16, Ordering};

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;

#[cfg(not(target_os = "espidf"))]
static SIM_LPG_ADC: AtomicU16 = AtomicU16::new(0);
#[cfg(not(target_os = "espidf"))]
static SIM_SMOKE_ADC: AtomicU16 = AtomicU16::new(0);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_lpg_adc(raw: u16) {
    SIM_LPG_ADC.store(raw, Ordering::Relaxed);
}

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_smoke_adc(raw: u16) {
    SIM_SMOKE_ADC.store(raw, Ordering::Relaxed);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasKind {
    Lpg,
    Smoke,
}

/// One analog gas sensor on an ADC1 channel.
pub struct GasSensor {
    kind: GasKind,
    last_raw: u16,
}

impl GasSensor {
    pub fn new(kind: GasKind) -> Self {
        Self { kind, last_raw: 0 }
    }

    /// Sample the ADC.  A failed conversion keeps the previous value.
    pub fn read(&mut self) -> u16 {
        if let Some(raw) = self.read_adc() {
            self.last_raw = raw;
        }
        self.last_raw
    }

    pub fn kind(&self) -> GasKind {
        self.kind
    }

    #[cfg(target_os = "espidf")]
    fn read_adc(&self) -> Option<u16> {
        let channel = match self.kind {
            GasKind::Lpg => hw_init::ADC1_CH_LPG,
            GasKind::Smoke => hw_init::ADC1_CH_SMOKE,
        };
        hw_init::adc1_read(channel)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_adc(&self) -> Option<u16> {
        Some(match self.kind {
            GasKind::Lpg => SIM_LPG_ADC.load(Ordering::Relaxed),
            GasKind::Smoke => SIM_SMOKE_ADC.load(Ordering::Relaxed),
        })
    }
}
