//! Per-shard polling scheduler.
//!
//! A worker owns one shard of cameras and drives the fixed-cadence poll loop
//! for the whole run duration. Camera visits within a tick are sequential in
//! stable shard order; a blocking device delays the cameras after it in the
//! same tick but cannot corrupt them, and every network operation is bounded
//! by the parser timeouts so one dead camera cannot stall the cadence
//! indefinitely.
//!
//! Failure policy: consecutive failures are counted per camera and reset on
//! any success. When the count reaches the configured threshold and removal
//! is enabled, the camera is retired from the shard for the rest of the run;
//! there is no re-admission. A shard that retires every camera idles until
//! the duration expires so that all workers finish together.

use std::thread;
use std::time::Instant;

use image::RgbImage;
use log::{debug, error, info, warn};

use crate::camera::Camera;
use crate::config::RunConfig;
use crate::filter::DuplicateFilter;
use crate::frame::timestamp_filename;
use crate::stream::FrameSource;

struct ActiveCamera {
    camera: Camera,
    source: FrameSource,
    consecutive_failures: u32,
    last_accepted: Option<RgbImage>,
}

impl ActiveCamera {
    fn new(camera: Camera, source: FrameSource) -> Self {
        Self {
            camera,
            source,
            consecutive_failures: 0,
            last_accepted: None,
        }
    }
}

pub struct CameraWorker {
    shard_index: usize,
    cameras: Vec<ActiveCamera>,
    filter: DuplicateFilter,
    cfg: RunConfig,
}

impl CameraWorker {
    pub fn new(shard_index: usize, shard: Vec<Camera>, cfg: RunConfig) -> Self {
        let cameras = shard
            .into_iter()
            .map(|camera| {
                let source = FrameSource::for_camera(&camera);
                ActiveCamera::new(camera, source)
            })
            .collect();
        Self {
            shard_index,
            cameras,
            filter: DuplicateFilter::new(cfg.difference_threshold),
            cfg,
        }
    }

    /// Test constructor with caller-supplied sources.
    #[cfg(test)]
    pub(crate) fn with_sources(
        shard_index: usize,
        pairs: Vec<(Camera, FrameSource)>,
        cfg: RunConfig,
    ) -> Self {
        let cameras = pairs
            .into_iter()
            .map(|(camera, source)| ActiveCamera::new(camera, source))
            .collect();
        Self {
            shard_index,
            cameras,
            filter: DuplicateFilter::new(cfg.difference_threshold),
            cfg,
        }
    }

    /// Run the poll loop until the configured duration elapses, then release
    /// every remaining source. An in-flight tick is allowed to finish; a new
    /// tick is never started past the deadline.
    pub fn run(mut self) {
        let started = Instant::now();
        info!(
            "worker {}: polling {} cameras every {:?} for {:?}",
            self.shard_index,
            self.cameras.len(),
            self.cfg.interval,
            self.cfg.duration
        );

        while started.elapsed() < self.cfg.duration {
            let tick_started = Instant::now();
            self.tick();
            if started.elapsed() >= self.cfg.duration {
                break;
            }
            let spent = tick_started.elapsed();
            if spent < self.cfg.interval {
                thread::sleep(self.cfg.interval - spent);
            }
            // An overrunning tick rolls straight into the next one; skipped
            // intervals are not made up.
        }

        for active in &mut self.cameras {
            active.source.close();
        }
        info!(
            "worker {}: run complete, {} cameras still active",
            self.shard_index,
            self.cameras.len()
        );
    }

    /// Visit every active camera once, then retire the ones that crossed the
    /// failure threshold.
    fn tick(&mut self) {
        for index in 0..self.cameras.len() {
            self.poll_camera(index);
        }

        if !self.cfg.remove_on_failure {
            return;
        }
        let threshold = self.cfg.failure_threshold;
        self.cameras.retain_mut(|active| {
            if active.consecutive_failures >= threshold {
                warn!(
                    "camera {}: retired after {} consecutive failures",
                    active.camera.id(),
                    active.consecutive_failures
                );
                active.source.close();
                false
            } else {
                true
            }
        });
    }

    fn poll_camera(&mut self, index: usize) {
        let filter = self.filter;
        let active = &mut self.cameras[index];

        // Persistent sources are opened lazily before first use, so a frame
        // is never requested from a closed session in normal operation.
        if active.source.is_persistent() && !active.source.is_open() {
            if let Err(err) = active.source.open() {
                warn!("camera {}: {}", active.camera.id(), err);
                active.consecutive_failures += 1;
                return;
            }
        }

        match active.source.get_frame() {
            Ok(frame) => {
                active.consecutive_failures = 0;
                let pixels = frame.image.to_rgb8();
                if let Some(previous) = &active.last_accepted {
                    if filter.is_duplicate(previous, &pixels) {
                        debug!("camera {}: duplicate frame discarded", active.camera.id());
                        return;
                    }
                }
                let path = self
                    .cfg
                    .output_root
                    .join(active.camera.id())
                    .join(timestamp_filename());
                match frame.save_jpeg(&path) {
                    Ok(()) => debug!(
                        "camera {}: saved {} ({} bytes)",
                        active.camera.id(),
                        path.display(),
                        frame.byte_len
                    ),
                    // A write failure is a local problem, not a camera
                    // failure; it does not count toward retirement.
                    Err(err) => error!("camera {}: {:#}", active.camera.id(), err),
                }
                active.last_accepted = Some(pixels);
            }
            Err(err) => {
                warn!("camera {}: {}", active.camera.id(), err);
                active.consecutive_failures += 1;
                if active.source.is_persistent() {
                    // A stale connection is the usual cause; replace it
                    // before the camera's next attempt.
                    if let Err(err) = active.source.restart() {
                        debug!("camera {}: restart failed: {}", active.camera.id(), err);
                    }
                }
            }
        }
    }
}
