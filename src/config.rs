//! System configuration parameters
//!
//! All tunable parameters for the KitchenGuard controller.  Values are
//! compile-time defaults that may be overridden once at boot from a JSON
//! document; nothing here is persisted across power loss.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Inputs ---
    /// Minimum time a raw line must hold steady before the stable value follows (ms)
    pub debounce_ms: u64,

    // --- Pump timing ---
    /// Settling delay after power-on before the pump may be requested (ms)
    pub startup_delay_ms: u64,
    /// Length of the flow-verification window after energising the pump (ms)
    pub flow_test_duration_ms: u64,
    /// Minimum pulses during the verification window to accept the run
    pub flow_pulse_threshold: u32,
    /// Timed refusal after a flow failure (ms)
    pub lockout_duration_ms: u64,
    /// Longest tolerated stretch of zero flow while running (ms)
    pub max_no_flow_duration_ms: u64,

    // --- Flow sensor ---
    /// Flow sensor calibration, pulses per litre (YF-S201: 450)
    pub flow_pulses_per_litre: f32,
    /// Flow sampling window while running (ms)
    pub flow_sample_interval_ms: u64,

    // --- Water presence ---
    /// When false, water is always treated as present
    pub water_presence_check_enabled: bool,

    // --- Intermittent (pump) alarm ---
    /// Pump attention tone pitch (Hz)
    pub pump_alarm_tone_hz: u16,
    /// Beep on-phase (ms)
    pub beep_on_ms: u64,
    /// Beep off-phase (ms)
    pub beep_off_ms: u64,

    // --- Hazard detection ---
    /// Raw ADC level above which LPG is reported
    pub lpg_threshold: u16,
    /// Raw ADC level above which smoke is reported
    pub smoke_threshold: u16,
    /// Gas sensor heater warm-up; LPG/smoke are ignored until it elapses (ms)
    pub sensor_warmup_ms: u64,
    pub fire_tone_hz: u16,
    pub lpg_tone_hz: u16,
    pub smoke_tone_hz: u16,
    /// Hazard buzzer on-phase while a hazard is claimed (ms)
    pub hazard_buzzer_on_ms: u64,
    /// Hazard buzzer off-phase while a hazard is claimed (ms)
    pub hazard_buzzer_off_ms: u64,

    // --- Reporting ---
    /// Status report interval (ms)
    pub status_interval_ms: u64,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Inputs
            debounce_ms: 50,

            // Pump timing
            startup_delay_ms: 3_000,
            flow_test_duration_ms: 8_000,
            flow_pulse_threshold: 10,
            lockout_duration_ms: 900_000, // 15 min
            max_no_flow_duration_ms: 10_000,

            // Flow sensor
            flow_pulses_per_litre: 450.0,
            flow_sample_interval_ms: 1_000,

            // Water presence
            water_presence_check_enabled: true,

            // Intermittent alarm
            pump_alarm_tone_hz: 750,
            beep_on_ms: 200,
            beep_off_ms: 1_800,

            // Hazards (12-bit ADC)
            lpg_threshold: 3_500,
            smoke_threshold: 3_000,
            sensor_warmup_ms: 30_000,
            fire_tone_hz: 3_200,
            lpg_tone_hz: 2_600,
            smoke_tone_hz: 2_000,
            hazard_buzzer_on_ms: 500,
            hazard_buzzer_off_ms: 2_000,

            // Reporting
            status_interval_ms: 2_000,
        }
    }
}

impl SystemConfig {
    /// Parse a boot-time override and validate it.  Missing fields keep
    /// their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|_| Error::Config("malformed config document"))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject contradictory values rather than clamping them.
    pub fn validate(&self) -> Result<()> {
        if self.debounce_ms == 0 {
            return Err(Error::Config("debounce_ms must be > 0"));
        }
        if self.flow_test_duration_ms == 0 {
            return Err(Error::Config("flow_test_duration_ms must be > 0"));
        }
        if self.flow_pulse_threshold == 0 {
            return Err(Error::Config("flow_pulse_threshold must be > 0"));
        }
        if self.flow_pulses_per_litre.is_nan() || self.flow_pulses_per_litre <= 0.0 {
            return Err(Error::Config("flow_pulses_per_litre must be > 0"));
        }
        if !(1_000..=2_000).contains(&self.flow_sample_interval_ms) {
            return Err(Error::Config("flow_sample_interval_ms must be within 1000..=2000"));
        }
        if self.max_no_flow_duration_ms < self.flow_sample_interval_ms {
            return Err(Error::Config(
                "max_no_flow_duration_ms shorter than one sampling window",
            ));
        }
        if self.lockout_duration_ms == 0 {
            return Err(Error::Config("lockout_duration_ms must be > 0"));
        }
        if self.beep_on_ms == 0 || self.beep_off_ms == 0 {
            return Err(Error::Config("beep phases must be > 0"));
        }
        if self.hazard_buzzer_on_ms == 0 || self.hazard_buzzer_off_ms == 0 {
            return Err(Error::Config("hazard buzzer phases must be > 0"));
        }
        if self.pump_alarm_tone_hz == 0 {
            return Err(Error::Config("pump_alarm_tone_hz must be > 0"));
        }
        let hazard_tones = [self.fire_tone_hz, self.lpg_tone_hz, self.smoke_tone_hz];
        if hazard_tones.contains(&0) {
            return Err(Error::Config("hazard tones must be > 0"));
        }
        if hazard_tones.contains(&self.pump_alarm_tone_hz) {
            return Err(Error::Config("pump tone must differ from every hazard tone"));
        }
        if self.status_interval_ms == 0 {
            return Err(Error::Config("status_interval_ms must be > 0"));
        }
        Ok(())
    }
}
