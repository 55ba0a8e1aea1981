use crate::angle::JointTriplet;
use crate::profile::PoseProfile;
use crate::util::mean;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Angle differences at or beyond this score zero.
pub const MAX_ANGLE_DIFF_DEGREES: f64 = 45.0;
/// A measurement within this many degrees of the expectation counts as
/// "this body part is roughly correct".
pub const TOLERANCE_DEGREES: f64 = 10.0;
/// Score floor applied to already-within-tolerance joints so accepted
/// measurements never flicker below a usable display value.
pub const ACCURACY_FLOOR: f64 = 70.0;
/// Overall accuracy at or above this is a correct pose. Canonical value;
/// deployments override it through `Config`.
pub const CORRECTNESS_THRESHOLD: f64 = 70.0;
/// Bound of the optional perceptual jitter.
const JITTER_BOUND: f64 = 5.0;

/// One joint's reading for a frame. `None` means the triplet was unavailable
/// (occluded or out of frame), which is distinct from a true 0-degree angle.
pub type JointReading = (JointTriplet, Option<f64>);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointScore {
    pub triplet: JointTriplet,
    pub accuracy: f64,
    pub measured: f64,
    pub within_tolerance: bool,
}

/// Aggregate verdict for one frame.
#[derive(Debug, Clone, Default)]
pub struct PoseScore {
    pub joints: Vec<JointScore>,
    pub overall: f64,
    pub is_correct: bool,
}

/// Maps measured joint angles against a pose's expectations.
///
/// Jitter is off by default; enabling it requires a seed so results stay
/// reproducible under test.
#[derive(Debug)]
pub struct AccuracyScorer {
    pub correctness_threshold: f64,
    pub tolerance_degrees: f64,
    jitter: Option<StdRng>,
}

impl AccuracyScorer {
    pub fn new(correctness_threshold: f64) -> Self {
        Self {
            correctness_threshold,
            tolerance_degrees: TOLERANCE_DEGREES,
            jitter: None,
        }
    }

    pub fn with_jitter_seed(mut self, seed: u64) -> Self {
        self.jitter = Some(StdRng::seed_from_u64(seed));
        self
    }

    /// Score one measurement in [0, 100]: linear falloff reaching 0 at a
    /// 45-degree difference, floored at 70 when already within tolerance.
    pub fn score(&mut self, measured: f64, expected: f64) -> f64 {
        let diff = (expected - measured).abs();
        let raw = 100.0 - (diff / MAX_ANGLE_DIFF_DEGREES) * 100.0;
        let mut score = raw.clamp(0.0, 100.0);

        if let Some(rng) = self.jitter.as_mut() {
            // Perceptual variety only; never lifts a zero and never escapes [0,100].
            if score > 0.0 {
                score = (score + rng.gen_range(-JITTER_BOUND..=JITTER_BOUND)).clamp(0.0, 100.0);
            }
        }

        // The floor binds last so jitter can never drag a within-tolerance
        // joint below it.
        if diff <= self.tolerance_degrees {
            score = score.max(ACCURACY_FLOOR);
        }

        score
    }

    /// Score every available joint and aggregate the verdict. Unavailable
    /// joints contribute nothing; joints scoring 0 are excluded from the
    /// mean. With no nonzero scores the overall accuracy is 0.
    pub fn score_joints(&mut self, readings: &[JointReading], profile: &PoseProfile) -> PoseScore {
        let mut joints = Vec::with_capacity(readings.len());
        for &(triplet, reading) in readings {
            if let Some(measured) = reading {
                let expected = profile.expected.get(triplet);
                let accuracy = self.score(measured, expected);
                joints.push(JointScore {
                    triplet,
                    accuracy,
                    measured,
                    within_tolerance: (expected - measured).abs() <= self.tolerance_degrees,
                });
            }
        }

        let nonzero: Vec<f64> = joints
            .iter()
            .map(|j| j.accuracy)
            .filter(|&a| a > 0.0)
            .collect();
        let overall = mean(&nonzero).unwrap_or(0.0);

        PoseScore {
            is_correct: overall >= self.correctness_threshold,
            overall,
            joints,
        }
    }
}

impl Default for AccuracyScorer {
    fn default() -> Self {
        Self::new(CORRECTNESS_THRESHOLD)
    }
}
