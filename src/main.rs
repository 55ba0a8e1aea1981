use asana::breathing::BreathPhase;
use asana::config::{Config, ConfigStore, FileConfigStore};
use asana::hold::HoldPhase;
use asana::profile::{Pose, ProfileTable};
use asana::progress::{JsonProgressStore, ProgressBook, ProgressStore};
use asana::scorer::PoseScore;
use asana::session::PracticeSession;
use asana::stats::AccuracyDb;
use clap::{Parser, Subcommand};
use itertools::Itertools;
use std::error::Error;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use time_humanize::{Accuracy, HumanTime, Tense};
use tracing_subscriber::EnvFilter;

/// pose practice companion: hold verification, breathing pacing, progress tracking
#[derive(Parser, Debug)]
#[clap(version, about)]
struct Cli {
    /// alternate config file
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the pose catalogue with hold and breathing parameters
    Poses,
    /// Show cumulative practice progress per pose
    Stats,
    /// Per-joint accuracy breakdown for one pose, weakest joint first
    Joints {
        #[clap(value_enum)]
        pose: Pose,
    },
    /// Export the joint accuracy history as CSV
    Export {
        /// output file (stdout if omitted)
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
    /// Run a synthetic practice session against a pose
    Simulate {
        #[clap(value_enum)]
        pose: Pose,

        /// seconds of simulated practice
        #[clap(short, long)]
        duration: Option<f64>,

        /// frames per simulated second
        #[clap(short, long, default_value_t = 1.0)]
        rate: f64,

        /// overall accuracy of the simulated practitioner
        #[clap(short, long, default_value_t = 90.0)]
        accuracy: f64,

        /// discard all progress and history writes
        #[clap(long)]
        ephemeral: bool,
    },
}

/// Store that never touches disk, for `simulate --ephemeral`.
struct NullProgressStore;

impl ProgressStore for NullProgressStore {
    fn load(&self) -> ProgressBook {
        ProgressBook::default()
    }

    fn save(&self, _book: &ProgressBook) -> std::io::Result<()> {
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => FileConfigStore::with_path(path).load(),
        None => FileConfigStore::new().load(),
    };

    match cli.command {
        Command::Poses => cmd_poses(),
        Command::Stats => cmd_stats(),
        Command::Joints { pose } => cmd_joints(pose),
        Command::Export { output } => cmd_export(output),
        Command::Simulate {
            pose,
            duration,
            rate,
            accuracy,
            ephemeral,
        } => cmd_simulate(&config, pose, duration, rate, accuracy, ephemeral),
    }
}

fn cmd_poses() -> Result<(), Box<dyn Error>> {
    let table = ProfileTable::builtin();
    println!(
        "{:<22}{:<30}{:>8}{:>10}{:>9}",
        "pose", "name", "hold", "cycle", "inhale"
    );
    for pose in Pose::ALL {
        let profile = table.get(pose);
        println!(
            "{:<22}{:<30}{:>7}s{:>9}s{:>8.0}%",
            pose.id(),
            pose.english_name(),
            profile.hold_secs,
            profile.breath_cycle_secs,
            profile.inhale_ratio * 100.0
        );
    }
    Ok(())
}

fn cmd_stats() -> Result<(), Box<dyn Error>> {
    let book = JsonProgressStore::new().load();
    println!(
        "{:<22}{:>9}{:>12}{:>16}{:>8}  {}",
        "pose", "attempts", "completions", "practice", "best", "last practiced"
    );
    for (id, rec) in book.iter() {
        let practice = if rec.total_practice_time > 0.0 {
            HumanTime::from(Duration::from_secs_f64(rec.total_practice_time))
                .to_text_en(Accuracy::Rough, Tense::Present)
        } else {
            "-".to_string()
        };
        let best = rec
            .best_accuracy
            .map(|b| format!("{b:.0}%"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<22}{:>9}{:>12}{:>16}{:>8}  {}",
            id,
            rec.attempts,
            rec.completions,
            practice,
            best,
            rec.last_practiced.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

fn cmd_joints(pose: Pose) -> Result<(), Box<dyn Error>> {
    let db = AccuracyDb::new()?;
    let summary = db.get_joint_summary(pose)?;
    if summary.is_empty() {
        println!("no recorded joint history for {}", pose.id());
        println!(
            "known poses: {}",
            Pose::ALL.iter().map(|p| p.id()).join(", ")
        );
        return Ok(());
    }

    println!("{} ({})", pose.id(), pose.english_name());
    for joint in &summary {
        println!(
            "  {:<12} avg {:>5.1}%  in-tolerance {:>5.1}%  ({} samples)",
            joint.joint, joint.avg_accuracy, joint.within_tolerance_rate, joint.samples
        );
    }
    Ok(())
}

fn cmd_export(output: Option<PathBuf>) -> Result<(), Box<dyn Error>> {
    let db = AccuracyDb::new()?;

    let mut writer: csv::Writer<Box<dyn std::io::Write>> = match output {
        Some(path) => csv::Writer::from_writer(Box::new(std::fs::File::create(path)?)),
        None => csv::Writer::from_writer(Box::new(std::io::stdout())),
    };

    writer.write_record([
        "pose",
        "joint",
        "accuracy",
        "angle",
        "within_tolerance",
        "timestamp",
    ])?;
    for pose in Pose::ALL {
        for sample in db.get_pose_samples(pose)? {
            writer.write_record([
                sample.pose.as_str(),
                sample.joint.as_str(),
                &format!("{:.2}", sample.accuracy),
                &format!("{:.2}", sample.angle),
                if sample.within_tolerance { "1" } else { "0" },
                &sample.timestamp.to_rfc3339(),
            ])?;
        }
    }
    writer.flush()?;
    Ok(())
}

fn cmd_simulate(
    config: &Config,
    pose: Pose,
    duration: Option<f64>,
    rate: f64,
    accuracy: f64,
    ephemeral: bool,
) -> Result<(), Box<dyn Error>> {
    if rate <= 0.0 {
        return Err("rate must be positive".into());
    }

    let profiles = ProfileTable::builtin();
    let profile = profiles.get(pose);
    let duration = duration.unwrap_or(profile.hold_secs + 5.0);
    let start = SystemTime::now();

    println!(
        "simulating {} for {:.0}s (hold target {:.0}s, accuracy {:.0}%)",
        pose.id(),
        duration,
        profile.hold_secs,
        accuracy
    );

    if ephemeral {
        let session = PracticeSession::new(pose, config, NullProgressStore, start);
        run_simulation(session, config, duration, rate, accuracy, start)
    } else {
        let session = PracticeSession::new(pose, config, JsonProgressStore::new(), start)
            .with_accuracy_db(AccuracyDb::new()?);
        run_simulation(session, config, duration, rate, accuracy, start)
    }
}

fn run_simulation<S: ProgressStore>(
    mut session: PracticeSession<S>,
    config: &Config,
    duration: f64,
    rate: f64,
    accuracy: f64,
    start: SystemTime,
) -> Result<(), Box<dyn Error>> {
    let frames = (duration * rate).ceil() as u64;
    let is_correct = accuracy >= config.correctness_threshold;

    for frame in 0..=frames {
        let t = frame as f64 / rate;
        let now = start + Duration::from_secs_f64(t);
        let score = PoseScore {
            joints: vec![],
            overall: accuracy,
            is_correct,
        };
        let outcome = session.process_score(score, now);

        if let Some(phase) = outcome.breath_cue {
            let cue = match phase {
                BreathPhase::Inhale => "breathe in",
                BreathPhase::Exhale => "breathe out",
            };
            println!("t={t:>6.1}s  {cue}");
        }

        if outcome.completed_now {
            println!(
                "t={t:>6.1}s  hold complete after {:.1}s",
                outcome.held_secs
            );
            break;
        }

        let report_every = (5.0 * rate).max(1.0) as u64;
        if outcome.phase == HoldPhase::Holding && frame % report_every == 0 {
            println!(
                "t={t:>6.1}s  holding {:.1}/{:.1}s",
                outcome.held_secs, outcome.required_secs
            );
        }
    }

    session.end(start + Duration::from_secs_f64(duration));

    let rec = session.progress().get(session.target());
    println!(
        "attempts {}  completions {}  practice {}  best {}",
        rec.attempts,
        rec.completions,
        HumanTime::from(Duration::from_secs_f64(rec.total_practice_time.max(0.0)))
            .to_text_en(Accuracy::Rough, Tense::Present),
        rec.best_accuracy
            .map(|b| format!("{b:.0}%"))
            .unwrap_or_else(|| "-".to_string())
    );

    Ok(())
}
