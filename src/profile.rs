use crate::angle::JointTriplet;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Hold required for a pose with no profile entry.
pub const DEFAULT_HOLD_SECS: f64 = 30.0;
/// Breathing cycle used for a pose with no profile entry.
pub const DEFAULT_BREATH_CYCLE_SECS: f64 = 6.0;
pub const DEFAULT_INHALE_RATIO: f64 = 0.4;
/// Expected joint angle used when a profile entry is missing (neutral straight joint).
pub const DEFAULT_EXPECTED_ANGLE: f64 = 180.0;

/// The closed set of poses the application knows about. String ids match the
/// keys used by the progress document and by external classifier label maps.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Pose {
    Tadasan,
    Vrksana,
    Balasana,
    Trikonasana,
    Virabhadrasana,
    Adhomukha,
    Bhujangasana,
    Setubandhasana,
    Uttanasana,
    Shavasana,
    Ardhamatsyendrasana,
}

impl Pose {
    pub const ALL: [Pose; 11] = [
        Pose::Tadasan,
        Pose::Vrksana,
        Pose::Balasana,
        Pose::Trikonasana,
        Pose::Virabhadrasana,
        Pose::Adhomukha,
        Pose::Bhujangasana,
        Pose::Setubandhasana,
        Pose::Uttanasana,
        Pose::Shavasana,
        Pose::Ardhamatsyendrasana,
    ];

    /// Stable lowercase id ("tadasan", "vrksana", ...).
    pub fn id(&self) -> &'static str {
        match self {
            Pose::Tadasan => "tadasan",
            Pose::Vrksana => "vrksana",
            Pose::Balasana => "balasana",
            Pose::Trikonasana => "trikonasana",
            Pose::Virabhadrasana => "virabhadrasana",
            Pose::Adhomukha => "adhomukha",
            Pose::Bhujangasana => "bhujangasana",
            Pose::Setubandhasana => "setubandhasana",
            Pose::Uttanasana => "uttanasana",
            Pose::Shavasana => "shavasana",
            Pose::Ardhamatsyendrasana => "ardhamatsyendrasana",
        }
    }

    /// Map a raw label (e.g. from an external classifier) onto the closed set.
    /// Unmapped labels stay opaque strings and simply never match a target.
    pub fn from_id(id: &str) -> Option<Pose> {
        Pose::ALL.iter().copied().find(|p| p.id() == id)
    }

    pub fn english_name(&self) -> &'static str {
        match self {
            Pose::Tadasan => "Mountain Pose",
            Pose::Vrksana => "Tree Pose",
            Pose::Balasana => "Child's Pose",
            Pose::Trikonasana => "Triangle Pose",
            Pose::Virabhadrasana => "Warrior Pose",
            Pose::Adhomukha => "Downward Facing Dog",
            Pose::Bhujangasana => "Cobra Pose",
            Pose::Setubandhasana => "Bridge Pose",
            Pose::Uttanasana => "Standing Forward Bend",
            Pose::Shavasana => "Corpse Pose",
            Pose::Ardhamatsyendrasana => "Half Lord of the Fishes Pose",
        }
    }
}

/// Expected angle per joint triplet for one pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointAngles {
    pub right_arm: f64,
    pub left_arm: f64,
    pub right_leg: f64,
    pub left_leg: f64,
}

impl JointAngles {
    pub fn get(&self, triplet: JointTriplet) -> f64 {
        match triplet {
            JointTriplet::RightArm => self.right_arm,
            JointTriplet::LeftArm => self.left_arm,
            JointTriplet::RightLeg => self.right_leg,
            JointTriplet::LeftLeg => self.left_leg,
        }
    }
}

/// Immutable reference record for one pose: expected angles, required hold,
/// and breathing cadence. Loaded once at startup, read-only thereafter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseProfile {
    pub expected: JointAngles,
    pub hold_secs: f64,
    pub breath_cycle_secs: f64,
    pub inhale_ratio: f64,
}

impl Default for PoseProfile {
    fn default() -> Self {
        Self {
            expected: JointAngles {
                right_arm: DEFAULT_EXPECTED_ANGLE,
                left_arm: DEFAULT_EXPECTED_ANGLE,
                right_leg: DEFAULT_EXPECTED_ANGLE,
                left_leg: DEFAULT_EXPECTED_ANGLE,
            },
            hold_secs: DEFAULT_HOLD_SECS,
            breath_cycle_secs: DEFAULT_BREATH_CYCLE_SECS,
            inhale_ratio: DEFAULT_INHALE_RATIO,
        }
    }
}

// (pose, right_arm, left_arm, right_leg, left_leg, hold, cycle, inhale_ratio)
#[rustfmt::skip]
const BUILTIN: [(Pose, f64, f64, f64, f64, f64, f64, f64); 11] = [
    (Pose::Tadasan,             201.0, 162.0, 177.0, 182.0,  20.0,  5.0, 0.5),
    (Pose::Vrksana,             207.0, 158.0, 180.0, 329.0,  30.0,  6.0, 0.4),
    (Pose::Balasana,            155.0, 167.0, 337.0, 335.0,  60.0, 10.0, 0.3),
    (Pose::Trikonasana,         181.0, 184.0, 176.0, 182.0,  40.0,  7.0, 0.4),
    (Pose::Virabhadrasana,      167.0, 166.0, 273.0, 178.0,  35.0,  6.0, 0.45),
    (Pose::Adhomukha,           176.0, 171.0, 177.0, 179.0,  45.0,  8.0, 0.5),
    (Pose::Bhujangasana,        160.0, 160.0, 175.0, 175.0,  40.0,  7.0, 0.4),
    (Pose::Setubandhasana,      195.0, 195.0, 260.0, 260.0,  50.0,  8.0, 0.4),
    (Pose::Uttanasana,          180.0, 180.0, 180.0, 180.0,  35.0,  6.0, 0.3),
    (Pose::Shavasana,           180.0, 180.0, 180.0, 180.0, 120.0, 12.0, 0.3),
    (Pose::Ardhamatsyendrasana, 175.0, 250.0, 270.0, 190.0,  45.0,  7.0, 0.4),
];

/// Static per-pose reference table built at startup. Lookups for a pose with
/// no entry fall back to the documented defaults instead of erroring, since
/// callers may request a pose before the table is extended.
#[derive(Debug, Clone)]
pub struct ProfileTable {
    entries: HashMap<Pose, PoseProfile>,
}

impl ProfileTable {
    pub fn builtin() -> Self {
        let entries = BUILTIN
            .iter()
            .map(|&(pose, ra, la, rl, ll, hold, cycle, ratio)| {
                (
                    pose,
                    PoseProfile {
                        expected: JointAngles {
                            right_arm: ra,
                            left_arm: la,
                            right_leg: rl,
                            left_leg: ll,
                        },
                        hold_secs: hold,
                        breath_cycle_secs: cycle,
                        inhale_ratio: ratio,
                    },
                )
            })
            .collect();
        Self { entries }
    }

    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn insert(&mut self, pose: Pose, profile: PoseProfile) {
        self.entries.insert(pose, profile);
    }

    pub fn get(&self, pose: Pose) -> PoseProfile {
        self.entries.get(&pose).copied().unwrap_or_default()
    }

    pub fn expected_angle(&self, pose: Pose, triplet: JointTriplet) -> f64 {
        self.get(pose).expected.get(triplet)
    }

    pub fn hold_secs(&self, pose: Pose) -> f64 {
        self.get(pose).hold_secs
    }

    pub fn breathing(&self, pose: Pose) -> (f64, f64) {
        let profile = self.get(pose);
        (profile.breath_cycle_secs, profile.inhale_ratio)
    }
}

impl Default for ProfileTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_pose_has_a_builtin_entry() {
        let table = ProfileTable::builtin();
        for pose in Pose::ALL {
            let profile = table.get(pose);
            assert!(profile.hold_secs > 0.0);
            assert!(profile.breath_cycle_secs > 0.0);
            assert!(profile.inhale_ratio > 0.0 && profile.inhale_ratio < 1.0);
        }
    }

    #[test]
    fn reference_angles_keep_reflex_values() {
        let table = ProfileTable::builtin();
        assert_eq!(
            table.expected_angle(Pose::Vrksana, JointTriplet::LeftLeg),
            329.0
        );
        assert_eq!(
            table.expected_angle(Pose::Virabhadrasana, JointTriplet::RightLeg),
            273.0
        );
    }

    #[test]
    fn missing_entry_falls_back_to_defaults() {
        let table = ProfileTable::empty();
        let profile = table.get(Pose::Shavasana);
        assert_eq!(profile.hold_secs, DEFAULT_HOLD_SECS);
        assert_eq!(profile.breath_cycle_secs, DEFAULT_BREATH_CYCLE_SECS);
        assert_eq!(profile.inhale_ratio, DEFAULT_INHALE_RATIO);
        assert_eq!(profile.expected.right_arm, DEFAULT_EXPECTED_ANGLE);
    }

    #[test]
    fn ids_round_trip() {
        for pose in Pose::ALL {
            assert_eq!(Pose::from_id(pose.id()), Some(pose));
            assert_eq!(pose.to_string(), pose.id());
        }
        assert_eq!(Pose::from_id("headstand"), None);
    }

    #[test]
    fn builtin_hold_durations_match_reference() {
        let table = ProfileTable::builtin();
        assert_eq!(table.hold_secs(Pose::Tadasan), 20.0);
        assert_eq!(table.hold_secs(Pose::Shavasana), 120.0);
    }
}
