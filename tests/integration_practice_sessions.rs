use asana::config::Config;
use asana::fusion::ClassifierVerdict;
use asana::hold::HoldPhase;
use asana::profile::Pose;
use asana::progress::{JsonProgressStore, ProgressStore};
use asana::scorer::PoseScore;
use asana::session::PracticeSession;
use assert_matches::assert_matches;
use std::time::{Duration, SystemTime};
use tempfile::tempdir;

fn at(secs: f64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs_f64(secs)
}

fn score(overall: f64, threshold: f64) -> PoseScore {
    PoseScore {
        joints: vec![],
        overall,
        is_correct: overall >= threshold,
    }
}

fn new_session(
    dir: &std::path::Path,
    pose: Pose,
    cfg: &Config,
) -> PracticeSession<JsonProgressStore> {
    let store = JsonProgressStore::with_path(dir.join("progress.json"));
    PracticeSession::new(pose, cfg, store, at(0.0))
}

#[test]
fn steady_hold_completes_at_the_required_duration() {
    let dir = tempdir().unwrap();
    let cfg = Config::default();
    let mut session = new_session(dir.path(), Pose::Tadasan, &cfg);

    // 25 one-second frames at 90% accuracy against a 20s hold
    let mut completed_at = None;
    for i in 0..25 {
        let outcome = session.process_score(score(90.0, cfg.correctness_threshold), at(i as f64));
        if outcome.completed_now {
            completed_at = Some(i);
        }
    }

    assert_eq!(completed_at, Some(20));

    let book = JsonProgressStore::with_path(dir.path().join("progress.json")).load();
    let rec = book.get(Pose::Tadasan);
    assert_eq!(rec.attempts, 1);
    assert_eq!(rec.completions, 1);
    assert_eq!(rec.total_practice_time, 20.0);
    assert_matches!(rec.best_accuracy, Some(b) if b >= 90.0);
    assert!(rec.last_practiced.is_some());
}

#[test]
fn one_bad_frame_does_not_reset_the_hold() {
    let dir = tempdir().unwrap();
    let cfg = Config::default();
    let mut session = new_session(dir.path(), Pose::Tadasan, &cfg);

    let mut completed_at = None;
    for i in 0..25 {
        let overall = if i == 10 { 40.0 } else { 90.0 };
        let outcome = session.process_score(score(overall, cfg.correctness_threshold), at(i as f64));
        if outcome.completed_now {
            completed_at = Some(i);
            break;
        }
    }

    // the single incorrect frame fell inside the grace period
    assert_eq!(completed_at, Some(20));
    let rec = session.progress().get(Pose::Tadasan);
    assert_eq!(rec.attempts, 1);
    assert_eq!(rec.completions, 1);
}

#[test]
fn sustained_break_resets_and_counts_a_second_attempt() {
    let dir = tempdir().unwrap();
    let cfg = Config::default();
    let mut session = new_session(dir.path(), Pose::Tadasan, &cfg);

    // 10s correct, 3s incorrect (past the 1.5s grace), then correct again
    for i in 0..10 {
        session.process_score(score(90.0, cfg.correctness_threshold), at(i as f64));
    }
    for i in 10..13 {
        let outcome = session.process_score(score(40.0, cfg.correctness_threshold), at(i as f64));
        assert!(!outcome.completed_now);
    }
    assert_eq!(session.hold_phase(), HoldPhase::Idle);

    let mut completed_at = None;
    for i in 13..40 {
        let outcome = session.process_score(score(90.0, cfg.correctness_threshold), at(i as f64));
        if outcome.completed_now {
            completed_at = Some(i);
            break;
        }
    }

    // the second attempt restarts the count from its own first correct frame
    assert_eq!(completed_at, Some(33));
    let rec = session.progress().get(Pose::Tadasan);
    assert_eq!(rec.attempts, 2);
    assert_eq!(rec.completions, 1);
    // 9s abandoned + 20s completed
    assert_eq!(rec.total_practice_time, 29.0);
}

#[test]
fn corroborating_confidence_gates_the_fused_verdict() {
    let dir = tempdir().unwrap();
    let cfg = Config::default();
    let mut session = new_session(dir.path(), Pose::Tadasan, &cfg);

    session.observe_classifier(ClassifierVerdict::new("tadasan", 0.65, at(0.0)));
    let outcome = session.process_score(score(90.0, cfg.correctness_threshold), at(0.5));
    assert!(outcome.is_correct);

    session.observe_classifier(ClassifierVerdict::new("tadasan", 0.3, at(1.0)));
    let outcome = session.process_score(score(90.0, cfg.correctness_threshold), at(1.5));
    assert!(!outcome.is_correct);
}

#[test]
fn progress_survives_across_sessions() {
    let dir = tempdir().unwrap();
    let cfg = Config::default();

    {
        let mut session = new_session(dir.path(), Pose::Vrksana, &cfg);
        for i in 0..=30 {
            session.process_score(score(95.0, cfg.correctness_threshold), at(i as f64));
        }
        session.end(at(31.0));
    }

    {
        let mut session = new_session(dir.path(), Pose::Vrksana, &cfg);
        assert_eq!(session.progress().get(Pose::Vrksana).completions, 1);
        for i in 0..=30 {
            session.process_score(score(85.0, cfg.correctness_threshold), at(100.0 + i as f64));
        }
        session.end(at(131.0));
    }

    let book = JsonProgressStore::with_path(dir.path().join("progress.json")).load();
    let rec = book.get(Pose::Vrksana);
    assert_eq!(rec.attempts, 2);
    assert_eq!(rec.completions, 2);
    assert_eq!(rec.total_practice_time, 60.0);
    // best accuracy keeps the first session's higher value
    assert_matches!(rec.best_accuracy, Some(b) if b == 95.0);
}

#[test]
fn corrupt_progress_file_starts_clean_and_heals_on_save() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("progress.json");
    std::fs::write(&path, b"{{{{ not json").unwrap();

    let cfg = Config::default();
    let mut session = new_session(dir.path(), Pose::Balasana, &cfg);
    assert_eq!(session.progress().get(Pose::Balasana).attempts, 0);

    session.process_score(score(90.0, cfg.correctness_threshold), at(0.0));
    session.end(at(10.0));

    let book = JsonProgressStore::with_path(&path).load();
    assert_eq!(book.get(Pose::Balasana).attempts, 1);
    assert_eq!(book.get(Pose::Balasana).total_practice_time, 10.0);
}

#[test]
fn sub_five_second_abandonments_accrue_no_practice_time() {
    let dir = tempdir().unwrap();
    let cfg = Config::default();
    let mut session = new_session(dir.path(), Pose::Tadasan, &cfg);

    for i in 0..4 {
        session.process_score(score(90.0, cfg.correctness_threshold), at(i as f64));
    }
    session.end(at(4.0));

    let rec = session.progress().get(Pose::Tadasan);
    assert_eq!(rec.attempts, 1);
    assert_eq!(rec.total_practice_time, 0.0);
}
