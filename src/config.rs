use crate::fusion::{CLASSIFIER_STALE_SECS, CORROBORATING_CONFIDENCE, STRONG_CONFIDENCE};
use crate::hold::GRACE_PERIOD_SECS;
use crate::scorer::{CORRECTNESS_THRESHOLD, TOLERANCE_DEGREES};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Policy knobs a deployment may override. Reference angle data is not
/// configurable here; it lives in the built-in profile table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub correctness_threshold: f64,
    pub tolerance_degrees: f64,
    pub grace_period_secs: f64,
    pub strong_confidence: f64,
    pub corroborating_confidence: f64,
    pub classifier_stale_secs: f64,
    /// Seed for display-accuracy jitter; `None` disables jitter entirely.
    pub jitter_seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            correctness_threshold: CORRECTNESS_THRESHOLD,
            tolerance_degrees: TOLERANCE_DEGREES,
            grace_period_secs: GRACE_PERIOD_SECS,
            strong_confidence: STRONG_CONFIDENCE,
            corroborating_confidence: CORROBORATING_CONFIDENCE,
            classifier_stale_secs: CLASSIFIER_STALE_SECS,
            jitter_seed: None,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "asana") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("asana_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(cfg) = serde_json::from_slice::<Config>(&bytes) {
                return cfg;
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}
