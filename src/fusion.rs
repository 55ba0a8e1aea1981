use crate::profile::Pose;
use crate::util::secs_between;
use std::time::SystemTime;

/// A classifier match at or above this confidence is accepted on its own.
pub const STRONG_CONFIDENCE: f64 = 0.8;
/// Below strong but at or above this, a classifier result can corroborate a
/// positive angle verdict.
pub const CORROBORATING_CONFIDENCE: f64 = 0.6;
/// Classifier results older than this are treated as unavailable, so stale
/// confidence alone can never extend a hold.
pub const CLASSIFIER_STALE_SECS: f64 = 2.0;

/// Latest result from the external frame classifier. The label is a raw
/// string: unmapped model classes pass through opaquely and simply never
/// match a target pose.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierVerdict {
    pub label: String,
    pub confidence: f64,
    pub at: SystemTime,
}

impl ClassifierVerdict {
    pub fn new(label: impl Into<String>, confidence: f64, at: SystemTime) -> Self {
        Self {
            label: label.into(),
            confidence,
            at,
        }
    }

    pub fn is_fresh(&self, now: SystemTime, stale_secs: f64) -> bool {
        secs_between(self.at, now) <= stale_secs
    }

    pub fn matches(&self, target: Pose) -> bool {
        self.label == target.id()
    }
}

/// Thresholds for combining the angle verdict with the classifier verdict.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionPolicy {
    pub strong_confidence: f64,
    pub corroborating_confidence: f64,
    pub stale_secs: f64,
}

impl Default for FusionPolicy {
    fn default() -> Self {
        Self {
            strong_confidence: STRONG_CONFIDENCE,
            corroborating_confidence: CORROBORATING_CONFIDENCE,
            stale_secs: CLASSIFIER_STALE_SECS,
        }
    }
}

impl FusionPolicy {
    /// The decision table, evaluated in order:
    /// 1. a strong classifier match alone suffices;
    /// 2. with no classifier, the angle verdict stands;
    /// 3. a weaker classifier signal requires angle corroboration;
    /// 4. otherwise the pose is not correct.
    pub fn fuse(
        &self,
        target: Pose,
        angle_correct: bool,
        classifier: Option<&ClassifierVerdict>,
        now: SystemTime,
    ) -> bool {
        let fresh = classifier.filter(|v| v.is_fresh(now, self.stale_secs));

        match fresh {
            Some(v) if v.matches(target) && v.confidence >= self.strong_confidence => true,
            None => angle_correct,
            Some(v) => angle_correct && v.confidence >= self.corroborating_confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn now() -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(1000)
    }

    fn verdict(label: &str, confidence: f64) -> ClassifierVerdict {
        ClassifierVerdict::new(label, confidence, now())
    }

    #[test]
    fn strong_classifier_match_alone_suffices() {
        let policy = FusionPolicy::default();
        let v = verdict("vrksana", 0.85);
        assert!(policy.fuse(Pose::Vrksana, false, Some(&v), now()));
    }

    #[test]
    fn strong_confidence_wrong_label_is_not_enough() {
        let policy = FusionPolicy::default();
        let v = verdict("balasana", 0.95);
        assert!(!policy.fuse(Pose::Vrksana, false, Some(&v), now()));
    }

    #[test]
    fn angle_only_when_classifier_absent() {
        let policy = FusionPolicy::default();
        assert!(policy.fuse(Pose::Tadasan, true, None, now()));
        assert!(!policy.fuse(Pose::Tadasan, false, None, now()));
    }

    #[test]
    fn weak_classifier_needs_angle_corroboration() {
        let policy = FusionPolicy::default();
        let v = verdict("tadasan", 0.65);
        assert!(policy.fuse(Pose::Tadasan, true, Some(&v), now()));
        assert!(!policy.fuse(Pose::Tadasan, false, Some(&v), now()));
    }

    #[test]
    fn very_low_confidence_vetoes_even_with_angle() {
        let policy = FusionPolicy::default();
        let v = verdict("tadasan", 0.3);
        assert!(!policy.fuse(Pose::Tadasan, true, Some(&v), now()));
    }

    #[test]
    fn unmapped_label_is_safe_default() {
        let policy = FusionPolicy::default();
        let v = verdict("class_17", 0.99);
        assert!(!policy.fuse(Pose::Tadasan, false, Some(&v), now()));
    }

    #[test]
    fn stale_verdict_is_treated_as_absent() {
        let policy = FusionPolicy::default();
        let old = ClassifierVerdict::new("tadasan", 0.95, now() - Duration::from_secs(5));
        // stale strong match no longer carries the verdict on its own
        assert!(!policy.fuse(Pose::Tadasan, false, Some(&old), now()));
        // but with the classifier out of the picture, angle stands alone
        assert!(policy.fuse(Pose::Tadasan, true, Some(&old), now()));
    }
}
