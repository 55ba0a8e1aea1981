use crate::profile::Pose;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Holds shorter than this accrue no practice time when abandoned.
pub const MIN_ACCRUAL_SECS: f64 = 5.0;

const LAST_PRACTICED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Cumulative per-pose counters. Field names are the on-disk document keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub attempts: u64,
    pub completions: u64,
    /// Seconds across all counted holds.
    pub total_practice_time: f64,
    /// Highest overall accuracy ever observed, if any frame has been scored.
    #[serde(default)]
    pub best_accuracy: Option<f64>,
    /// Local wall-clock timestamp of the most recent counted activity.
    #[serde(default)]
    pub last_practiced: Option<String>,
}

impl Default for ProgressRecord {
    fn default() -> Self {
        Self {
            attempts: 0,
            completions: 0,
            total_practice_time: 0.0,
            best_accuracy: None,
            last_practiced: None,
        }
    }
}

impl ProgressRecord {
    pub fn record_attempt(&mut self, now: SystemTime) {
        self.attempts += 1;
        self.touch(now);
    }

    /// A finished hold. Completions stay bounded by attempts because every
    /// completion is preceded by exactly one `record_attempt`.
    pub fn record_completion(&mut self, held_secs: f64, now: SystemTime) {
        self.completions += 1;
        self.total_practice_time += held_secs;
        self.touch(now);
    }

    /// An abandoned hold. Sub-5-second holds are noise and accrue nothing;
    /// the attempt itself was already counted when the hold started.
    pub fn record_abandoned(&mut self, held_secs: f64, now: SystemTime) {
        if held_secs >= MIN_ACCRUAL_SECS {
            self.total_practice_time += held_secs;
            self.touch(now);
        }
    }

    pub fn observe_accuracy(&mut self, accuracy: f64) {
        let best = self.best_accuracy.get_or_insert(accuracy);
        if accuracy > *best {
            *best = accuracy;
        }
    }

    fn touch(&mut self, now: SystemTime) {
        let local: DateTime<Local> = now.into();
        self.last_practiced = Some(local.format(LAST_PRACTICED_FORMAT).to_string());
    }
}

/// The whole progress document: one record per pose id. Poses never
/// practiced still appear, zero-filled, so consumers can iterate the full
/// catalogue without special cases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressBook {
    records: BTreeMap<String, ProgressRecord>,
}

impl Default for ProgressBook {
    fn default() -> Self {
        let records = Pose::ALL
            .iter()
            .map(|pose| (pose.id().to_string(), ProgressRecord::default()))
            .collect();
        Self { records }
    }
}

impl ProgressBook {
    pub fn get(&self, pose: Pose) -> &ProgressRecord {
        // every pose is seeded in fill_missing / Default
        self.records
            .get(pose.id())
            .unwrap_or(&ZERO_RECORD)
    }

    pub fn get_mut(&mut self, pose: Pose) -> &mut ProgressRecord {
        self.records.entry(pose.id().to_string()).or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ProgressRecord)> {
        self.records.iter().map(|(id, rec)| (id.as_str(), rec))
    }

    /// Seed zero-filled records for poses a foreign or older document lacks.
    fn fill_missing(&mut self) {
        for pose in Pose::ALL {
            self.records.entry(pose.id().to_string()).or_default();
        }
    }
}

static ZERO_RECORD: ProgressRecord = ProgressRecord {
    attempts: 0,
    completions: 0,
    total_practice_time: 0.0,
    best_accuracy: None,
    last_practiced: None,
};

pub trait ProgressStore {
    /// Reads never fail: a missing or corrupt document yields a zero-filled
    /// book so practice can always start.
    fn load(&self) -> ProgressBook;
    fn save(&self, book: &ProgressBook) -> std::io::Result<()>;
}

/// Whole-document JSON persistence. Each save rewrites the full file, so the
/// document on disk is always internally consistent.
#[derive(Debug, Clone)]
pub struct JsonProgressStore {
    path: PathBuf,
}

impl JsonProgressStore {
    pub fn new() -> Self {
        let path = crate::app_dirs::AppDirs::progress_path()
            .unwrap_or_else(|| PathBuf::from("asana_progress.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for JsonProgressStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressStore for JsonProgressStore {
    fn load(&self) -> ProgressBook {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(mut book) = serde_json::from_slice::<ProgressBook>(&bytes) {
                book.fill_missing();
                return book;
            }
        }
        ProgressBook::default()
    }

    fn save(&self, book: &ProgressBook) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(book).unwrap_or_default();
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    fn at(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn fresh_book_is_zero_filled_for_all_poses() {
        let book = ProgressBook::default();
        let mut count = 0;
        for (_, rec) in book.iter() {
            assert_eq!(rec.attempts, 0);
            assert_eq!(rec.completions, 0);
            assert_eq!(rec.total_practice_time, 0.0);
            assert_eq!(rec.best_accuracy, None);
            assert_eq!(rec.last_practiced, None);
            count += 1;
        }
        assert_eq!(count, Pose::ALL.len());
    }

    #[test]
    fn load_missing_file_yields_default() {
        let dir = tempdir().unwrap();
        let store = JsonProgressStore::with_path(dir.path().join("nope.json"));
        assert_eq!(store.load(), ProgressBook::default());
    }

    #[test]
    fn load_corrupt_file_yields_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("progress.json");
        fs::write(&path, b"{not json").unwrap();
        let store = JsonProgressStore::with_path(&path);
        assert_eq!(store.load(), ProgressBook::default());
    }

    #[test]
    fn roundtrip_preserves_records() {
        let dir = tempdir().unwrap();
        let store = JsonProgressStore::with_path(dir.path().join("progress.json"));

        let mut book = ProgressBook::default();
        let rec = book.get_mut(Pose::Vrksana);
        rec.record_attempt(at(1_700_000_000));
        rec.record_completion(30.0, at(1_700_000_030));
        rec.observe_accuracy(91.5);

        store.save(&book).unwrap();
        let loaded = store.load();
        let rec = loaded.get(Pose::Vrksana);
        assert_eq!(rec.attempts, 1);
        assert_eq!(rec.completions, 1);
        assert_eq!(rec.total_practice_time, 30.0);
        assert_eq!(rec.best_accuracy, Some(91.5));
        assert!(rec.last_practiced.is_some());
    }

    #[test]
    fn partial_document_is_backfilled() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("progress.json");
        fs::write(
            &path,
            br#"{"tadasan":{"attempts":4,"completions":2,"total_practice_time":80.0,"best_accuracy":88.0,"last_practiced":"2026-08-01 09:00:00"}}"#,
        )
        .unwrap();

        let book = JsonProgressStore::with_path(&path).load();
        assert_eq!(book.get(Pose::Tadasan).attempts, 4);
        assert_eq!(book.get(Pose::Shavasana).attempts, 0);
        assert_eq!(book.iter().count(), Pose::ALL.len());
    }

    #[test]
    fn short_abandoned_holds_accrue_nothing() {
        let mut rec = ProgressRecord::default();
        rec.record_abandoned(4.9, at(100));
        assert_eq!(rec.total_practice_time, 0.0);
        assert_eq!(rec.last_practiced, None);

        rec.record_abandoned(5.0, at(100));
        assert_eq!(rec.total_practice_time, 5.0);
        assert!(rec.last_practiced.is_some());
    }

    #[test]
    fn best_accuracy_only_improves() {
        let mut rec = ProgressRecord::default();
        rec.observe_accuracy(70.0);
        rec.observe_accuracy(85.0);
        rec.observe_accuracy(60.0);
        assert_eq!(rec.best_accuracy, Some(85.0));
    }

    #[test]
    fn timestamp_format_is_stable() {
        let mut rec = ProgressRecord::default();
        rec.record_attempt(SystemTime::now());
        let stamp = rec.last_practiced.unwrap();
        // "YYYY-MM-DD HH:MM:SS"
        assert_eq!(stamp.len(), 19);
        assert_eq!(&stamp[4..5], "-");
        assert_eq!(&stamp[10..11], " ");
        assert_eq!(&stamp[13..14], ":");
    }
}
