use crate::angle::{joint_angle, JointTriplet, Landmark};
use crate::breathing::{BreathPhase, BreathState, BreathingPacer};
use crate::config::Config;
use crate::fusion::{ClassifierVerdict, FusionPolicy};
use crate::hold::{HoldEvent, HoldPhase, HoldTimer};
use crate::profile::{Pose, ProfileTable};
use crate::progress::{ProgressBook, ProgressStore};
use crate::scorer::{AccuracyScorer, JointReading, PoseScore};
use crate::stats::AccuracyDb;
use std::time::SystemTime;
use tracing::warn;

/// What one processed frame looked like, for display and for callers that
/// drive audio or UI cues.
#[derive(Debug, Clone)]
pub struct FrameOutcome {
    pub score: PoseScore,
    /// Fused verdict actually fed to the hold timer.
    pub is_correct: bool,
    pub phase: HoldPhase,
    pub held_secs: f64,
    pub required_secs: f64,
    /// True on exactly one frame per completed hold.
    pub completed_now: bool,
    pub breath: BreathState,
    /// Set when the pacer crossed an inhale/exhale boundary this frame.
    pub breath_cue: Option<BreathPhase>,
}

/// Read-only view of the session between frames, for presentation layers
/// that poll faster than samples arrive. Pure: takes no state transitions
/// and consumes no one-shot notifications.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusSnapshot {
    pub target: Pose,
    pub phase: HoldPhase,
    pub held_secs: f64,
    pub required_secs: f64,
    pub breath: BreathState,
}

/// Orchestrates one practice run: scoring, fusion, the hold timer, the
/// breathing pacer, and durable progress. Owns the progress book for its
/// lifetime and writes it back through the store on every counter mutation.
pub struct PracticeSession<S: ProgressStore> {
    target: Pose,
    profiles: ProfileTable,
    scorer: AccuracyScorer,
    fusion: FusionPolicy,
    timer: HoldTimer,
    pacer: BreathingPacer,
    latest_classifier: Option<ClassifierVerdict>,
    /// Highest overall accuracy seen during the hold currently in flight.
    hold_peak_accuracy: Option<f64>,
    book: ProgressBook,
    store: S,
    db: Option<AccuracyDb>,
    ended: bool,
}

impl<S: ProgressStore> PracticeSession<S> {
    pub fn new(target: Pose, cfg: &Config, store: S, now: SystemTime) -> Self {
        let profiles = ProfileTable::builtin();
        let profile = profiles.get(target);

        let mut scorer = AccuracyScorer::new(cfg.correctness_threshold);
        scorer.tolerance_degrees = cfg.tolerance_degrees;
        if let Some(seed) = cfg.jitter_seed {
            scorer = scorer.with_jitter_seed(seed);
        }

        let fusion = FusionPolicy {
            strong_confidence: cfg.strong_confidence,
            corroborating_confidence: cfg.corroborating_confidence,
            stale_secs: cfg.classifier_stale_secs,
        };

        let timer = HoldTimer::new(profile.hold_secs).with_grace_secs(cfg.grace_period_secs);
        let pacer = BreathingPacer::new(profile.breath_cycle_secs, profile.inhale_ratio, now);
        let book = store.load();

        Self {
            target,
            profiles,
            scorer,
            fusion,
            timer,
            pacer,
            latest_classifier: None,
            hold_peak_accuracy: None,
            book,
            store,
            db: None,
            ended: false,
        }
    }

    /// Attach a joint-history database; per-joint samples of every scored
    /// frame are recorded into it.
    pub fn with_accuracy_db(mut self, db: AccuracyDb) -> Self {
        self.db = Some(db);
        self
    }

    pub fn target(&self) -> Pose {
        self.target
    }

    pub fn progress(&self) -> &ProgressBook {
        &self.book
    }

    pub fn hold_phase(&self) -> HoldPhase {
        self.timer.phase()
    }

    /// Poll the session without feeding a sample. A hold in flight reports
    /// its duration as of `now`.
    pub fn status(&self, now: SystemTime) -> StatusSnapshot {
        StatusSnapshot {
            target: self.target,
            phase: self.timer.phase(),
            held_secs: self
                .timer
                .active_hold_secs(now)
                .unwrap_or_else(|| self.timer.held_secs()),
            required_secs: self.timer.required_secs(),
            breath: self.pacer.phase(now),
        }
    }

    /// Switch the target pose mid-run. Any hold in flight is closed out
    /// first so its practice time is not lost, then the timer and pacer
    /// restart against the new pose's profile.
    pub fn set_target(&mut self, target: Pose, now: SystemTime) {
        if target == self.target {
            return;
        }
        self.close_active_hold(now);
        self.target = target;
        let profile = self.profiles.get(target);
        self.timer.reset(profile.hold_secs);
        self.pacer
            .reanchor(profile.breath_cycle_secs, profile.inhale_ratio, now);
        self.latest_classifier = None;
    }

    /// Feed the newest classifier verdict. Arrival order is the caller's
    /// concern; staleness is judged against frame time at fusion.
    pub fn observe_classifier(&mut self, verdict: ClassifierVerdict) {
        self.latest_classifier = Some(verdict);
    }

    /// Process one frame of landmarks: measure, score, fuse, advance the
    /// hold timer, and persist any progress mutations.
    pub fn process_frame(&mut self, landmarks: &[Landmark], now: SystemTime) -> FrameOutcome {
        let readings: Vec<JointReading> = JointTriplet::ALL
            .iter()
            .map(|&t| (t, joint_angle(landmarks, t)))
            .collect();
        let profile = self.profiles.get(self.target);
        let score = self.scorer.score_joints(&readings, &profile);
        self.process_score(score, now)
    }

    /// Same as `process_frame` but starting from an already-scored frame.
    pub fn process_score(&mut self, score: PoseScore, now: SystemTime) -> FrameOutcome {
        let is_correct =
            self.fusion
                .fuse(self.target, score.is_correct, self.latest_classifier.as_ref(), now);

        if let Some(db) = self.db.as_mut() {
            if let Err(e) = db.record_frame(self.target, &score) {
                warn!(pose = self.target.id(), error = %e, "joint history write failed");
            }
        }

        let event = self.timer.sample(now, is_correct);
        let mut mutated = false;
        match event {
            Some(HoldEvent::AttemptStarted) => {
                self.hold_peak_accuracy = Some(score.overall);
                self.book.get_mut(self.target).record_attempt(now);
                mutated = true;
            }
            Some(HoldEvent::Completed { held_secs }) => {
                // best accuracy moves only when a hold completes
                let peak = self
                    .hold_peak_accuracy
                    .take()
                    .unwrap_or(score.overall)
                    .max(score.overall);
                let rec = self.book.get_mut(self.target);
                rec.observe_accuracy(peak);
                rec.record_completion(held_secs, now);
                mutated = true;
            }
            Some(HoldEvent::Abandoned { held_secs }) => {
                self.hold_peak_accuracy = None;
                self.book
                    .get_mut(self.target)
                    .record_abandoned(held_secs, now);
                mutated = true;
            }
            None => {
                if self.timer.phase() == HoldPhase::Holding {
                    let peak = self.hold_peak_accuracy.get_or_insert(score.overall);
                    *peak = peak.max(score.overall);
                }
            }
        }
        if mutated {
            self.persist();
        }

        FrameOutcome {
            is_correct,
            phase: self.timer.phase(),
            held_secs: self.timer.held_secs(),
            required_secs: self.timer.required_secs(),
            completed_now: self.timer.take_completion_notification(),
            breath: self.pacer.phase(now),
            breath_cue: self.pacer.advance(now),
            score,
        }
    }

    /// Restart the hold for another attempt at the same pose.
    pub fn restart_hold(&mut self, now: SystemTime) {
        self.close_active_hold(now);
        let profile = self.profiles.get(self.target);
        self.timer.reset(profile.hold_secs);
    }

    /// Finish the run: close out any hold in flight and write the book.
    pub fn end(&mut self, now: SystemTime) {
        if self.ended {
            return;
        }
        self.ended = true;
        self.close_active_hold(now);
        self.persist();
    }

    fn close_active_hold(&mut self, now: SystemTime) {
        self.hold_peak_accuracy = None;
        if let Some(held_secs) = self.timer.active_hold_secs(now) {
            self.book
                .get_mut(self.target)
                .record_abandoned(held_secs, now);
            self.persist();
        }
    }

    // Persistence failures are reported, never fatal: the in-memory book
    // stays authoritative and the next mutation retries the write.
    fn persist(&mut self) {
        if let Err(e) = self.store.save(&self.book) {
            warn!(error = %e, "progress write failed");
        }
    }
}

impl<S: ProgressStore> Drop for PracticeSession<S> {
    fn drop(&mut self) {
        if !self.ended {
            self.ended = true;
            self.close_active_hold(SystemTime::now());
            self.persist();
        }
    }
}
