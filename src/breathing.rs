use crate::util::secs_between;
use std::time::SystemTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum BreathPhase {
    Inhale,
    Exhale,
}

/// Snapshot of the pacer at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreathState {
    pub phase: BreathPhase,
    /// Fraction of the current phase already elapsed, in [0, 1).
    pub progress: f64,
}

/// Metronome for guided breathing during a hold. The phase is a pure
/// function of the anchor time and the cycle geometry, so drift cannot
/// accumulate: skipped polls land exactly where the clock says they should.
#[derive(Debug, Clone)]
pub struct BreathingPacer {
    cycle_secs: f64,
    inhale_ratio: f64,
    anchor: SystemTime,
    prev_phase: Option<BreathPhase>,
}

impl BreathingPacer {
    pub fn new(cycle_secs: f64, inhale_ratio: f64, anchor: SystemTime) -> Self {
        Self {
            cycle_secs,
            inhale_ratio,
            anchor,
            prev_phase: None,
        }
    }

    pub fn cycle_secs(&self) -> f64 {
        self.cycle_secs
    }

    /// Pure phase lookup, no state change.
    pub fn phase(&self, now: SystemTime) -> BreathState {
        let elapsed = secs_between(self.anchor, now) % self.cycle_secs;
        let inhale_secs = self.cycle_secs * self.inhale_ratio;
        if elapsed < inhale_secs {
            BreathState {
                phase: BreathPhase::Inhale,
                progress: elapsed / inhale_secs,
            }
        } else {
            BreathState {
                phase: BreathPhase::Exhale,
                progress: (elapsed - inhale_secs) / (self.cycle_secs - inhale_secs),
            }
        }
    }

    /// Poll the pacer; returns the new phase only on an inhale/exhale
    /// boundary so the caller can emit one cue per transition.
    pub fn advance(&mut self, now: SystemTime) -> Option<BreathPhase> {
        let phase = self.phase(now).phase;
        let transitioned = self.prev_phase != Some(phase);
        self.prev_phase = Some(phase);
        if transitioned {
            Some(phase)
        } else {
            None
        }
    }

    /// Restart the cycle (pose change re-anchors the metronome).
    pub fn reanchor(&mut self, cycle_secs: f64, inhale_ratio: f64, now: SystemTime) {
        self.cycle_secs = cycle_secs;
        self.inhale_ratio = inhale_ratio;
        self.anchor = now;
        self.prev_phase = None;
    }
}
