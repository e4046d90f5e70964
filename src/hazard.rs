//! Hazard alarm arbitrator.
//!
//! Runs **every tick before the pump FSM**.  Classifies the flame line and
//! the two gas readings into a single prioritised [`HazardAlarmState`] and
//! reports only *changes* of that state, so a condition that persists for
//! minutes raises exactly one alarm.
//!
//! ## Priority
//!
//! ```text
//!   Fire (flame line) > Lpg (gas > threshold) > Smoke (smoke > threshold) > Off
//! ```
//!
//! Priority lives in [`HazardAlarmState::rank`]; classification is a plain
//! maximum over the asserted candidates.
//!
//! ## Warm-up
//!
//! MQ-series heaters read high for the first ~30 s.  Until
//! `sensor_warmup_ms` has elapsed since [`HazardArbitrator::start`] the gas
//! and smoke channels are ignored; the flame line is honoured from the
//! first tick.

use log::{error, info};
use serde::{Deserialize, Serialize};

use crate::config::SystemConfig;

/// The highest-priority active hazard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HazardAlarmState {
    Off,
    Fire,
    Lpg,
    Smoke,
}

impl HazardAlarmState {
    /// Total order used for arbitration: higher wins.
    pub const fn rank(self) -> u8 {
        match self {
            Self::Off => 0,
            Self::Smoke => 1,
            Self::Lpg => 2,
            Self::Fire => 3,
        }
    }

    /// Pick the higher-ranked of two states.
    pub fn max_by_rank(self, other: Self) -> Self {
        if other.rank() > self.rank() { other } else { self }
    }

    pub fn is_active(self) -> bool {
        self != Self::Off
    }

    /// Pitch of the continuous tone claimed while this hazard is active.
    pub fn tone_hz(self, config: &SystemConfig) -> Option<u16> {
        match self {
            Self::Off => None,
            Self::Fire => Some(config.fire_tone_hz),
            Self::Lpg => Some(config.lpg_tone_hz),
            Self::Smoke => Some(config.smoke_tone_hz),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Off => "clear",
            Self::Fire => "FIRE",
            Self::Lpg => "LPG LEAK",
            Self::Smoke => "SMOKE",
        }
    }
}

/// Hazard readings for one tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct HazardReadings {
    /// Debounced flame line (already polarity-corrected).
    pub flame_detected: bool,
    pub lpg_level: u16,
    pub smoke_level: u16,
}

/// An edge of the hazard state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HazardTransition {
    /// Entered (or escalated/de-escalated into) a non-Off state.
    Raised(HazardAlarmState),
    /// Returned to Off.
    Cleared,
}

/// Edge-triggered arbitrator.
pub struct HazardArbitrator {
    lpg_threshold: u16,
    smoke_threshold: u16,
    warmup_ms: u64,
    /// Clock reading the warm-up is measured from.
    started_ms: u64,
    warmed_up: bool,
    state: HazardAlarmState,
}

impl HazardArbitrator {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            lpg_threshold: config.lpg_threshold,
            smoke_threshold: config.smoke_threshold,
            warmup_ms: config.sensor_warmup_ms,
            started_ms: 0,
            warmed_up: config.sensor_warmup_ms == 0,
            state: HazardAlarmState::Off,
        }
    }

    /// Begin the warm-up at `now_ms`.  Call once when the service starts.
    pub fn start(&mut self, now_ms: u64) {
        self.started_ms = now_ms;
        if !self.warmed_up {
            info!("HAZARD: gas sensors warming up for {}ms", self.warmup_ms);
        }
    }

    /// Pure classification of one set of readings.
    pub fn classify(&self, readings: &HazardReadings) -> HazardAlarmState {
        let candidates = [
            (readings.flame_detected, HazardAlarmState::Fire),
            (
                self.warmed_up && readings.lpg_level > self.lpg_threshold,
                HazardAlarmState::Lpg,
            ),
            (
                self.warmed_up && readings.smoke_level > self.smoke_threshold,
                HazardAlarmState::Smoke,
            ),
        ];
        candidates
            .into_iter()
            .filter(|(fired, _)| *fired)
            .fold(HazardAlarmState::Off, |acc, (_, s)| acc.max_by_rank(s))
    }

    /// Re-evaluate all sensors.  Returns `Some` only when the state changed.
    pub fn evaluate(&mut self, readings: &HazardReadings, now_ms: u64) -> Option<HazardTransition> {
        let detected = self.classify(readings);
        if detected == self.state {
            return None;
        }

        self.state = detected;
        if detected.is_active() {
            error!(
                "HAZARD: {} (lpg={} smoke={})",
                detected.label(),
                readings.lpg_level,
                readings.smoke_level
            );
            Some(HazardTransition::Raised(detected))
        } else {
            info!("HAZARD: kitchen clear at t={}ms", now_ms);
            Some(HazardTransition::Cleared)
        }
    }

    /// Advance the warm-up timer.  Returns `true` exactly once, on the tick
    /// the gas sensors become trusted.
    pub fn poll_warmup(&mut self, now_ms: u64) -> bool {
        if !self.warmed_up && now_ms.saturating_sub(self.started_ms) >= self.warmup_ms {
            self.warmed_up = true;
            info!("HAZARD: gas sensor warm-up complete");
            return true;
        }
        false
    }

    pub fn state(&self) -> HazardAlarmState {
        self.state
    }

    pub fn is_warmed_up(&self) -> bool {
        self.warmed_up
    }
}
