use serde::{Deserialize, Serialize};

/// Landmarks below this visibility are treated as absent when measuring a triplet.
pub const VISIBILITY_THRESHOLD: f64 = 0.7;

/// A single 2D skeletal landmark as produced by an external detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub index: usize,
    pub x: f64,
    pub y: f64,
    pub visibility: f64,
}

impl Landmark {
    pub fn new(index: usize, x: f64, y: f64, visibility: f64) -> Self {
        Self {
            index,
            x,
            y,
            visibility,
        }
    }
}

/// The four joint triplets whose included angles are compared against pose
/// reference data. Indices follow the external landmark source's skeleton
/// numbering (shoulder-elbow-wrist, hip-knee-ankle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum JointTriplet {
    RightArm,
    LeftArm,
    RightLeg,
    LeftLeg,
}

impl JointTriplet {
    pub const ALL: [JointTriplet; 4] = [
        JointTriplet::RightArm,
        JointTriplet::LeftArm,
        JointTriplet::RightLeg,
        JointTriplet::LeftLeg,
    ];

    pub fn landmark_indices(&self) -> [usize; 3] {
        match self {
            JointTriplet::RightArm => [12, 14, 16],
            JointTriplet::LeftArm => [11, 13, 15],
            JointTriplet::RightLeg => [24, 26, 28],
            JointTriplet::LeftLeg => [23, 25, 27],
        }
    }
}

/// Angle at vertex `p2` swept from the p2->p1 direction to the p2->p3
/// direction, in degrees normalized to [0, 360). Values above 180 are
/// meaningful; the reference data encodes angles like 329 and 273.
pub fn angle_between(p1: (f64, f64), p2: (f64, f64), p3: (f64, f64)) -> f64 {
    let angle = (p3.1 - p2.1).atan2(p3.0 - p2.0) - (p1.1 - p2.1).atan2(p1.0 - p2.0);
    let mut degrees = angle.to_degrees();
    if degrees < 0.0 {
        degrees += 360.0;
    }
    degrees
}

/// Measure the included angle of one joint triplet from a landmark set.
///
/// Returns `None` when any of the triplet's three landmarks is missing or
/// falls below the visibility threshold; the caller treats that frame as an
/// ordinary incorrect sample, never as an error.
pub fn joint_angle(landmarks: &[Landmark], triplet: JointTriplet) -> Option<f64> {
    let [i1, i2, i3] = triplet.landmark_indices();
    let p1 = find_visible(landmarks, i1)?;
    let p2 = find_visible(landmarks, i2)?;
    let p3 = find_visible(landmarks, i3)?;
    Some(angle_between(p1, p2, p3))
}

fn find_visible(landmarks: &[Landmark], index: usize) -> Option<(f64, f64)> {
    landmarks
        .iter()
        .find(|lm| lm.index == index && lm.visibility >= VISIBILITY_THRESHOLD)
        .map(|lm| (lm.x, lm.y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triplet_landmarks(indices: [usize; 3], points: [(f64, f64); 3]) -> Vec<Landmark> {
        indices
            .iter()
            .zip(points.iter())
            .map(|(&i, &(x, y))| Landmark::new(i, x, y, 1.0))
            .collect()
    }

    #[test]
    fn straight_line_is_180() {
        let angle = angle_between((0.0, 0.0), (1.0, 0.0), (2.0, 0.0));
        assert!((angle - 180.0).abs() < 1e-9);
    }

    #[test]
    fn right_angle_sweeps() {
        // p1 above vertex, p3 to the right: sweep from "up" to "right"
        let angle = angle_between((0.0, -1.0), (0.0, 0.0), (1.0, 0.0));
        assert!((angle - 90.0).abs() < 1e-9);

        // reversed sweep lands on the reflex side
        let reflex = angle_between((1.0, 0.0), (0.0, 0.0), (0.0, -1.0));
        assert!((reflex - 270.0).abs() < 1e-9);
    }

    #[test]
    fn angle_always_in_range() {
        let grid = [-2.0, -1.0, -0.5, 0.5, 1.0, 2.0];
        for &x1 in &grid {
            for &y1 in &grid {
                for &x3 in &grid {
                    for &y3 in &grid {
                        let a = angle_between((x1, y1), (0.0, 0.0), (x3, y3));
                        assert!((0.0..360.0).contains(&a), "angle {a} out of range");
                    }
                }
            }
        }
    }

    #[test]
    fn joint_angle_reads_triplet_indices() {
        let landmarks = triplet_landmarks([12, 14, 16], [(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
        let angle = joint_angle(&landmarks, JointTriplet::RightArm).unwrap();
        assert!((angle - 180.0).abs() < 1e-9);
    }

    #[test]
    fn joint_angle_missing_landmark_is_none() {
        // wrist (16) absent
        let landmarks = vec![
            Landmark::new(12, 0.0, 0.0, 1.0),
            Landmark::new(14, 1.0, 0.0, 1.0),
        ];
        assert_eq!(joint_angle(&landmarks, JointTriplet::RightArm), None);
    }

    #[test]
    fn joint_angle_low_visibility_is_none() {
        let mut landmarks =
            triplet_landmarks([23, 25, 27], [(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
        landmarks[1].visibility = 0.5;
        assert_eq!(joint_angle(&landmarks, JointTriplet::LeftLeg), None);
    }

    #[test]
    fn triplet_names_are_snake_case() {
        assert_eq!(JointTriplet::RightArm.to_string(), "right_arm");
        assert_eq!(JointTriplet::LeftLeg.to_string(), "left_leg");
    }
}
