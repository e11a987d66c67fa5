//! Run orchestration.
//!
//! The archiver turns a camera list into shards, bootstraps the output
//! directory tree, launches one worker thread per non-empty shard with a
//! short stagger between launches (so the first tick of every shard does not
//! hit the fleet at the same instant), and blocks until every worker has run
//! its full duration. Workers share nothing but the filesystem, which is
//! partitioned by camera id.

use std::fs;
use std::path::Path;
use std::thread;

use anyhow::{Context, Result};
use log::{error, info};

use crate::camera::Camera;
use crate::config::RunConfig;
use crate::manifest;
use crate::worker::CameraWorker;

pub struct Archiver {
    cfg: RunConfig,
}

impl Archiver {
    pub fn new(cfg: RunConfig) -> Result<Self> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    /// Archive the cameras named by a line-oriented URL manifest.
    pub fn archive_url_manifest(&self, manifest_path: &Path) -> Result<()> {
        let cameras = manifest::read_url_manifest(manifest_path)?;
        self.archive(cameras)
    }

    /// Archive the cameras named by a JSON record manifest.
    pub fn archive_record_manifest(&self, manifest_path: &Path) -> Result<()> {
        let cameras = manifest::read_record_manifest(manifest_path)?;
        self.archive(cameras)
    }

    /// Archive frames from the given cameras for the configured duration.
    /// Startup errors (unwritable output root) abort before any worker
    /// launches; per-camera failures during the run never propagate here.
    pub fn archive(&self, cameras: Vec<Camera>) -> Result<()> {
        if cameras.is_empty() {
            info!("no cameras to archive");
            return Ok(());
        }

        ensure_writable_root(&self.cfg.output_root)?;
        for camera in &cameras {
            let dir = self.cfg.output_root.join(camera.id());
            // Pre-existing directories are fine; earlier runs leave them.
            fs::create_dir_all(&dir)
                .with_context(|| format!("create camera directory {}", dir.display()))?;
        }

        let shards = round_robin(cameras, self.cfg.workers);
        info!(
            "archiving across {} shard(s) for {:?}",
            shards.len(),
            self.cfg.duration
        );

        let mut handles = Vec::new();
        for (index, shard) in shards.into_iter().enumerate() {
            let worker = CameraWorker::new(index, shard, self.cfg.clone());
            handles.push(thread::spawn(move || worker.run()));
            thread::sleep(self.cfg.stagger);
        }

        for handle in handles {
            if handle.join().is_err() {
                error!("camera worker panicked");
            }
        }
        Ok(())
    }
}

/// Partition cameras into at most `shard_count` shards: shard `i` receives
/// every `shard_count`-th camera starting at index `i`. Empty shards are
/// dropped, which happens when there are more shards than cameras. A shard
/// count of zero is treated as one shard.
pub fn round_robin(cameras: Vec<Camera>, shard_count: usize) -> Vec<Vec<Camera>> {
    let shard_count = shard_count.max(1);
    let mut shards: Vec<Vec<Camera>> = (0..shard_count).map(|_| Vec::new()).collect();
    for (index, camera) in cameras.into_iter().enumerate() {
        shards[index % shard_count].push(camera);
    }
    shards.retain(|shard| !shard.is_empty());
    shards
}

/// The output root must exist and accept writes before any worker launches.
fn ensure_writable_root(root: &Path) -> Result<()> {
    fs::create_dir_all(root)
        .with_context(|| format!("create output root {}", root.display()))?;
    let probe = root.join(".write-probe");
    fs::write(&probe, b"probe")
        .with_context(|| format!("output root {} is not writable", root.display()))?;
    let _ = fs::remove_file(&probe);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn cameras(count: usize) -> Vec<Camera> {
        (1..=count)
            .map(|id| Camera::NonIp {
                id: id.to_string(),
                snapshot_url: format!("http://cam.test/{}.jpg", id),
            })
            .collect()
    }

    #[test]
    fn round_robin_is_a_partition() {
        let shards = round_robin(cameras(7), 3);
        assert_eq!(shards.len(), 3);

        let mut seen: Vec<&str> = shards
            .iter()
            .flat_map(|shard| shard.iter().map(Camera::id))
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, ["1", "2", "3", "4", "5", "6", "7"]);

        let max = shards.iter().map(Vec::len).max().unwrap();
        let min = shards.iter().map(Vec::len).min().unwrap();
        assert!(max - min <= 1);

        // Deterministic: shard 0 holds cameras 1, 4, 7.
        let first: Vec<&str> = shards[0].iter().map(Camera::id).collect();
        assert_eq!(first, ["1", "4", "7"]);
    }

    #[test]
    fn empty_shards_are_dropped() {
        let shards = round_robin(cameras(2), 5);
        assert_eq!(shards.len(), 2);
        assert!(shards.iter().all(|shard| shard.len() == 1));
    }

    #[test]
    fn zero_shard_count_yields_one_shard() {
        let shards = round_robin(cameras(3), 0);
        assert_eq!(shards.len(), 1);
        assert_eq!(shards[0].len(), 3);
    }

    #[test]
    fn archive_bootstraps_directories_and_completes() {
        let out = tempfile::tempdir().unwrap();
        // A pre-existing camera directory is not an error.
        fs::create_dir_all(out.path().join("1")).unwrap();

        let cfg = RunConfig {
            duration: Duration::from_millis(100),
            interval: Duration::from_millis(50),
            output_root: out.path().to_path_buf(),
            workers: 3,
            stagger: Duration::ZERO,
            ..RunConfig::default()
        };
        // Nothing listens on these URLs; every poll fails, the run still
        // completes after its duration.
        let archiver = Archiver::new(cfg).unwrap();
        archiver
            .archive(vec![
                Camera::NonIp {
                    id: "1".to_string(),
                    snapshot_url: "http://127.0.0.1:9/snap.jpg".to_string(),
                },
                Camera::NonIp {
                    id: "2".to_string(),
                    snapshot_url: "http://127.0.0.1:9/snap.jpg".to_string(),
                },
            ])
            .unwrap();

        assert!(out.path().join("1").is_dir());
        assert!(out.path().join("2").is_dir());
    }

    #[test]
    fn unwritable_output_root_is_a_startup_error() {
        // A regular file where the root should be: create_dir_all fails.
        let file = tempfile::NamedTempFile::new().unwrap();
        let cfg = RunConfig {
            output_root: file.path().to_path_buf(),
            stagger: Duration::ZERO,
            ..RunConfig::default()
        };
        let archiver = Archiver::new(cfg).unwrap();
        assert!(archiver.archive(cameras(1)).is_err());
    }

    #[test]
    fn empty_camera_list_is_a_no_op() {
        let cfg = RunConfig {
            output_root: std::path::PathBuf::from("/nonexistent/never-created"),
            ..RunConfig::default()
        };
        let archiver = Archiver::new(cfg).unwrap();
        assert!(archiver.archive(Vec::new()).is_ok());
    }
}
