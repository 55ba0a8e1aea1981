use crate::util::secs_between;
use std::time::SystemTime;

/// Incorrect samples within this window do not reset a running hold.
/// Canonical value; deployments override it through `Config`.
pub const GRACE_PERIOD_SECS: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldPhase {
    Idle,
    Holding,
    Completed,
}

/// State transitions surfaced to the owning session so it can mutate and
/// persist progress counters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HoldEvent {
    /// A new hold attempt began (exactly once per attempt, not per frame).
    AttemptStarted,
    /// The required duration was reached. Fires exactly once per attempt.
    Completed { held_secs: f64 },
    /// The grace period elapsed while incorrect; carries the abandoned
    /// duration so the session can decide whether to accrue it.
    Abandoned { held_secs: f64 },
}

/// Debounced hold timer for one target pose.
///
/// IDLE -> HOLDING on a correct sample; HOLDING survives incorrect samples
/// shorter than the grace period; HOLDING -> COMPLETED once the duration
/// reaches the requirement, and COMPLETED is terminal until `reset`.
#[derive(Debug)]
pub struct HoldTimer {
    phase: HoldPhase,
    required_secs: f64,
    grace_secs: f64,
    hold_started_at: Option<SystemTime>,
    incorrect_since: Option<SystemTime>,
    held_secs: f64,
    completion_notified: bool,
}

impl HoldTimer {
    pub fn new(required_secs: f64) -> Self {
        Self {
            phase: HoldPhase::Idle,
            required_secs,
            grace_secs: GRACE_PERIOD_SECS,
            hold_started_at: None,
            incorrect_since: None,
            held_secs: 0.0,
            completion_notified: false,
        }
    }

    pub fn with_grace_secs(mut self, grace_secs: f64) -> Self {
        self.grace_secs = grace_secs;
        self
    }

    pub fn phase(&self) -> HoldPhase {
        self.phase
    }

    pub fn held_secs(&self) -> f64 {
        self.held_secs
    }

    pub fn required_secs(&self) -> f64 {
        self.required_secs
    }

    pub fn is_completed(&self) -> bool {
        self.phase == HoldPhase::Completed
    }

    /// One-shot completion notification: true exactly once after completing,
    /// so repeated polling never re-fires it.
    pub fn take_completion_notification(&mut self) -> bool {
        if self.phase == HoldPhase::Completed && !self.completion_notified {
            self.completion_notified = true;
            true
        } else {
            false
        }
    }

    /// Feed one judged sample. Samples must arrive in capture order.
    pub fn sample(&mut self, now: SystemTime, is_correct: bool) -> Option<HoldEvent> {
        if self.phase == HoldPhase::Completed {
            return None;
        }

        if is_correct {
            self.incorrect_since = None;

            let started = match self.hold_started_at {
                Some(started) => started,
                None => {
                    self.hold_started_at = Some(now);
                    self.held_secs = 0.0;
                    self.phase = HoldPhase::Holding;
                    return Some(HoldEvent::AttemptStarted);
                }
            };

            self.held_secs = secs_between(started, now);
            if self.held_secs >= self.required_secs {
                self.phase = HoldPhase::Completed;
                return Some(HoldEvent::Completed {
                    held_secs: self.held_secs,
                });
            }
            None
        } else {
            if self.phase != HoldPhase::Holding {
                return None;
            }

            let incorrect_since = *self.incorrect_since.get_or_insert(now);
            if secs_between(incorrect_since, now) >= self.grace_secs {
                let held = self.held_secs;
                self.clear_hold();
                return Some(HoldEvent::Abandoned { held_secs: held });
            }

            // Transient drop: the start time is kept, so the clock resumes
            // against it on the next correct sample. The held duration itself
            // freezes at the last correct sample.
            None
        }
    }

    /// Full reset to IDLE (pose change or explicit restart). Cumulative
    /// progress counters live elsewhere and are not touched.
    pub fn reset(&mut self, required_secs: f64) {
        self.required_secs = required_secs;
        self.phase = HoldPhase::Idle;
        self.completion_notified = false;
        self.clear_hold();
    }

    /// Duration of the hold currently in flight as of `now`, if any, for
    /// flush-on-exit.
    pub fn active_hold_secs(&self, now: SystemTime) -> Option<f64> {
        match (self.phase, self.hold_started_at) {
            (HoldPhase::Holding, Some(started)) => Some(secs_between(started, now)),
            _ => None,
        }
    }

    fn clear_hold(&mut self) {
        self.hold_started_at = None;
        self.incorrect_since = None;
        self.held_secs = 0.0;
        if self.phase == HoldPhase::Holding {
            self.phase = HoldPhase::Idle;
        }
    }
}
