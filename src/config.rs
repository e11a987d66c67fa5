//! Run configuration.
//!
//! One immutable value shared by the orchestrator and every worker for the
//! lifetime of a run. There are no ambient defaults to mutate later; callers
//! build the value up front and the archiver validates it before any worker
//! launches.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};

pub const DEFAULT_OUTPUT_ROOT: &str = "results";
pub const DEFAULT_WORKERS: usize = 1;
pub const DEFAULT_DIFFERENCE_THRESHOLD: f64 = 10.0;
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;
const DEFAULT_STAGGER_MS: u64 = 500;

#[derive(Clone, Debug)]
pub struct RunConfig {
    /// Total wall-clock run duration; the only cancellation mechanism.
    pub duration: Duration,
    /// Best-effort poll cadence per shard.
    pub interval: Duration,
    /// Root under which each camera gets its own directory.
    pub output_root: PathBuf,
    /// Number of shards, each driven by one worker.
    pub workers: usize,
    /// Duplicate-difference threshold as a percentage in [0, 100].
    pub difference_threshold: f64,
    /// Whether cameras are retired after repeated consecutive failures.
    pub remove_on_failure: bool,
    /// Consecutive failures before a camera is retired.
    pub failure_threshold: u32,
    /// Delay between worker launches, to avoid a synchronized first burst.
    pub stagger: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(1),
            interval: Duration::from_secs(1),
            output_root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
            workers: DEFAULT_WORKERS,
            difference_threshold: DEFAULT_DIFFERENCE_THRESHOLD,
            remove_on_failure: true,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            stagger: Duration::from_millis(DEFAULT_STAGGER_MS),
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(anyhow!("worker count must be at least 1"));
        }
        if self.interval.is_zero() {
            return Err(anyhow!("poll interval must be greater than zero"));
        }
        if !(0.0..=100.0).contains(&self.difference_threshold) {
            return Err(anyhow!(
                "duplicate-difference threshold must be a percentage in [0, 100]"
            ));
        }
        if self.failure_threshold == 0 {
            return Err(anyhow!("failure threshold must be at least 1"));
        }
        Ok(())
    }
}
