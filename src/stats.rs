use crate::app_dirs::AppDirs;
use crate::profile::Pose;
use crate::scorer::PoseScore;
use chrono::{DateTime, Local};
use rusqlite::{params, Connection, Result};
use std::path::PathBuf;

/// One scored joint measurement, as persisted for later analysis.
#[derive(Debug, Clone)]
pub struct JointSample {
    pub pose: String,
    pub joint: String,
    pub accuracy: f64,
    pub angle: f64,
    pub within_tolerance: bool,
    pub timestamp: DateTime<Local>,
}

/// Per-joint rollup for one pose.
#[derive(Debug, Clone, PartialEq)]
pub struct JointSummary {
    pub joint: String,
    pub avg_accuracy: f64,
    pub within_tolerance_rate: f64,
    pub samples: i64,
}

/// Database manager for joint accuracy history
#[derive(Debug)]
pub struct AccuracyDb {
    conn: Connection,
}

impl AccuracyDb {
    /// Initialize the database connection and create tables if needed
    pub fn new() -> Result<Self> {
        let db_path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("asana_stats.db"));

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {}", e)),
                )
            })?;
        }

        let conn = Connection::open(&db_path)?;
        Self::init_schema(&conn)?;
        Ok(AccuracyDb { conn })
    }

    /// In-memory database, used by tests and `--ephemeral` runs.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(AccuracyDb { conn })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS joint_samples (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                pose TEXT NOT NULL,
                joint TEXT NOT NULL,
                accuracy REAL NOT NULL,
                angle REAL NOT NULL,
                within_tolerance BOOLEAN NOT NULL,
                timestamp TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_joint_samples_pose ON joint_samples(pose)",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_joint_samples_timestamp ON joint_samples(timestamp)",
            [],
        )?;

        Ok(())
    }

    /// Record a single joint sample
    pub fn record_sample(&self, sample: &JointSample) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO joint_samples
            (pose, joint, accuracy, angle, within_tolerance, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                sample.pose,
                sample.joint,
                sample.accuracy,
                sample.angle,
                sample.within_tolerance,
                sample.timestamp.to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    /// Record every joint of one scored frame in a batch transaction
    pub fn record_frame(&mut self, pose: Pose, score: &PoseScore) -> Result<()> {
        let now = Local::now();
        let tx = self.conn.transaction()?;

        for joint in &score.joints {
            tx.execute(
                r#"
                INSERT INTO joint_samples
                (pose, joint, accuracy, angle, within_tolerance, timestamp)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    pose.id(),
                    joint.triplet.to_string(),
                    joint.accuracy,
                    joint.measured,
                    joint.within_tolerance,
                    now.to_rfc3339(),
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Get all samples recorded for a pose, newest first
    pub fn get_pose_samples(&self, pose: Pose) -> Result<Vec<JointSample>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT pose, joint, accuracy, angle, within_tolerance, timestamp
            FROM joint_samples
            WHERE pose = ?1
            ORDER BY timestamp DESC
            "#,
        )?;

        let sample_iter = stmt.query_map([pose.id()], |row| {
            let timestamp_str: String = row.get(5)?;
            let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
                .map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        5,
                        "timestamp".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?
                .with_timezone(&Local);

            Ok(JointSample {
                pose: row.get(0)?,
                joint: row.get(1)?,
                accuracy: row.get(2)?,
                angle: row.get(3)?,
                within_tolerance: row.get(4)?,
                timestamp,
            })
        })?;

        let mut samples = Vec::new();
        for sample in sample_iter {
            samples.push(sample?);
        }

        Ok(samples)
    }

    /// Get average accuracy across all joints for a pose
    pub fn get_avg_accuracy(&self, pose: Pose) -> Result<Option<f64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT AVG(accuracy) FROM joint_samples WHERE pose = ?1")?;

        let avg: Option<f64> = stmt.query_row([pose.id()], |row| row.get(0))?;
        Ok(avg)
    }

    /// Per-joint rollup for a pose: average accuracy, how often the joint was
    /// within tolerance, and sample count. Ordered worst joint first so the
    /// weakest body part tops the report.
    pub fn get_joint_summary(&self, pose: Pose) -> Result<Vec<JointSummary>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT
                joint,
                AVG(accuracy) as avg_accuracy,
                (SUM(CASE WHEN within_tolerance = 1 THEN 1 ELSE 0 END) * 100.0 / COUNT(*)) as in_tol,
                COUNT(*) as samples
            FROM joint_samples
            WHERE pose = ?1
            GROUP BY joint
            ORDER BY avg_accuracy ASC
            "#,
        )?;

        let summary_iter = stmt.query_map([pose.id()], |row| {
            Ok(JointSummary {
                joint: row.get(0)?,
                avg_accuracy: row.get(1)?,
                within_tolerance_rate: row.get(2)?,
                samples: row.get(3)?,
            })
        })?;

        let mut summary = Vec::new();
        for item in summary_iter {
            summary.push(item?);
        }

        Ok(summary)
    }

    /// Summary across all poses: (pose id, avg accuracy, sample count)
    pub fn get_all_pose_summary(&self) -> Result<Vec<(String, f64, i64)>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT pose, AVG(accuracy) as avg_accuracy, COUNT(*) as samples
            FROM joint_samples
            GROUP BY pose
            ORDER BY pose
            "#,
        )?;

        let summary_iter = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get(1)?, row.get(2)?))
        })?;

        let mut summary = Vec::new();
        for item in summary_iter {
            summary.push(item?);
        }

        Ok(summary)
    }

    /// Clear all samples (for testing or reset purposes)
    pub fn clear_all(&self) -> Result<()> {
        self.conn.execute("DELETE FROM joint_samples", [])?;
        Ok(())
    }
}
