//! Shared audio output: intermittent pump alarm and tone arbitration.
//!
//! One speaker serves two owners.  The hazard arbitrator claims a
//! continuous tone; the pump FSM asks for an intermittent "needs
//! attention" beep.  The hazard always wins:
//!
//! | Hazard | Intermittent phase | Output                      |
//! |--------|--------------------|-----------------------------|
//! | active | any                | `Continuous(hazard pitch)`  |
//! | Off    | On                 | `Pulsed(pump pitch)`        |
//! | Off    | Off / inactive     | `Silence`                   |
//!
//! The intermittent driver consults the hazard state itself before
//! rendering, and drops its phase whenever it is suppressed, so a beep
//! interrupted by a hazard never resumes half-way through.
//!
//! The hazard buzzer is a separate line with its own on/off cadence
//! ([`HazardBuzzer`]); it never carries the pump beep.

use serde::{Deserialize, Serialize};

use crate::config::SystemConfig;
use crate::hazard::HazardAlarmState;

/// A request for the shared tone output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToneCommand {
    #[default]
    Silence,
    /// Steady tone at the given pitch (hazard alarm).
    Continuous(u16),
    /// One beep of the pump's on/off pattern at the given pitch.
    Pulsed(u16),
}

impl ToneCommand {
    pub fn is_sounding(self) -> bool {
        !matches!(self, Self::Silence)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeepPhase {
    On,
    Off,
}

/// Two-phase on/off timer.
///
/// Phases are timed from the last phase change, not aligned to the clock.
/// A reset pattern always restarts in the on-phase.
#[derive(Debug, Clone, Copy)]
pub struct BeepPattern {
    on_ms: u64,
    off_ms: u64,
    phase: Option<(BeepPhase, u64)>,
}

impl BeepPattern {
    pub fn new(on_ms: u64, off_ms: u64) -> Self {
        Self {
            on_ms,
            off_ms,
            phase: None,
        }
    }

    /// Forget the current phase.
    pub fn reset(&mut self) {
        self.phase = None;
    }

    pub fn phase(&self) -> Option<BeepPhase> {
        self.phase.map(|(p, _)| p)
    }

    /// Advance to `now_ms` and return whether the on-phase is current.
    pub fn advance(&mut self, now_ms: u64) -> bool {
        let next = match self.phase {
            None => (BeepPhase::On, now_ms),
            Some((BeepPhase::On, since)) if now_ms.saturating_sub(since) >= self.on_ms => {
                (BeepPhase::Off, now_ms)
            }
            Some((BeepPhase::Off, since)) if now_ms.saturating_sub(since) >= self.off_ms => {
                (BeepPhase::On, now_ms)
            }
            Some(current) => current,
        };
        self.phase = Some(next);
        next.0 == BeepPhase::On
    }
}

/// The pump's "needs attention" beep.
///
/// Activation (or release from hazard suppression) always starts in the
/// on-phase.
pub struct IntermittentAlarm {
    pattern: BeepPattern,
    pitch_hz: u16,
    active: bool,
}

impl IntermittentAlarm {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            pattern: BeepPattern::new(config.beep_on_ms, config.beep_off_ms),
            pitch_hz: config.pump_alarm_tone_hz,
            active: false,
        }
    }

    /// Set by the pump FSM each tick.
    pub fn set_active(&mut self, active: bool) {
        if !active {
            self.pattern.reset();
        }
        self.active = active;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn phase(&self) -> Option<BeepPhase> {
        self.pattern.phase()
    }

    /// Advance the pattern and return whether the beep is sounding.
    pub fn render(&mut self, now_ms: u64, hazard: HazardAlarmState) -> bool {
        if !self.active || hazard.is_active() {
            self.pattern.reset();
            return false;
        }
        self.pattern.advance(now_ms)
    }

    pub fn pitch_hz(&self) -> u16 {
        self.pitch_hz
    }
}

/// Cadence of the 12 V hazard buzzer, which pulses (500 ms on, 2000 ms
/// off by default) for as long as any hazard is claimed.  The speaker
/// tone stays continuous underneath it.
pub struct HazardBuzzer {
    pattern: BeepPattern,
}

impl HazardBuzzer {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            pattern: BeepPattern::new(config.hazard_buzzer_on_ms, config.hazard_buzzer_off_ms),
        }
    }

    /// Return whether the buzzer line should be driven this tick.  The
    /// cadence restarts from the on-phase each time a hazard begins;
    /// escalation between hazards keeps it running.
    pub fn render(&mut self, now_ms: u64, hazard: HazardAlarmState) -> bool {
        if !hazard.is_active() {
            self.pattern.reset();
            return false;
        }
        self.pattern.advance(now_ms)
    }

    pub fn phase(&self) -> Option<BeepPhase> {
        self.pattern.phase()
    }
}

/// Resolve the single command for the shared output.
pub fn arbitrate(hazard: HazardAlarmState, beep_on: bool, config: &SystemConfig) -> ToneCommand {
    if let Some(hz) = hazard.tone_hz(config) {
        ToneCommand::Continuous(hz)
    } else if beep_on {
        ToneCommand::Pulsed(config.pump_alarm_tone_hz)
    } else {
        ToneCommand::Silence
    }
}
