//! Command-line front end for the camera-fleet image archiver.
//!
//! Reads a camera manifest, runs the archiver for the requested duration,
//! and exits. All per-camera failure handling happens inside the run; the
//! process only fails on startup errors (bad manifest, unwritable output).

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use cam_archiver::{config, Archiver, RunConfig};

#[derive(Parser, Debug)]
#[command(name = "archiverd", version, about = "Archive frames from a fleet of network cameras")]
struct Args {
    /// Camera manifest: one URL per line, or a JSON array with --records.
    manifest: PathBuf,

    /// Total run duration in seconds.
    #[arg(long, default_value_t = 60)]
    duration: u64,

    /// Poll interval per camera in seconds.
    #[arg(long, default_value_t = 1)]
    interval: u64,

    /// Number of worker threads (shards).
    #[arg(long, default_value_t = config::DEFAULT_WORKERS)]
    workers: usize,

    /// Output directory root.
    #[arg(long, env = "ARCHIVER_OUTPUT", default_value = config::DEFAULT_OUTPUT_ROOT)]
    output: PathBuf,

    /// Duplicate-difference threshold as a percentage in [0, 100].
    #[arg(long, default_value_t = config::DEFAULT_DIFFERENCE_THRESHOLD)]
    threshold: f64,

    /// Consecutive failures before a camera is retired.
    #[arg(long, default_value_t = config::DEFAULT_FAILURE_THRESHOLD)]
    failure_threshold: u32,

    /// Keep polling failing cameras instead of retiring them.
    #[arg(long)]
    keep_failing: bool,

    /// Treat the manifest as a JSON array of camera records.
    #[arg(long)]
    records: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let cfg = RunConfig {
        duration: Duration::from_secs(args.duration),
        interval: Duration::from_secs(args.interval),
        output_root: args.output,
        workers: args.workers,
        difference_threshold: args.threshold,
        remove_on_failure: !args.keep_failing,
        failure_threshold: args.failure_threshold,
        ..RunConfig::default()
    };

    let archiver = Archiver::new(cfg)?;
    if args.records {
        archiver.archive_record_manifest(&args.manifest)
    } else {
        archiver.archive_url_manifest(&args.manifest)
    }
}
