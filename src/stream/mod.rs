//! Frame-source parsers.
//!
//! Each camera protocol variant gets one parser:
//! - `snapshot`: one-shot HTTP GET of the most recent frame
//! - `mjpeg`: persistent multipart (`--myboundary`) stream
//! - `playlist`: stateless pull from a live playlist (`.m3u8`)
//!
//! All variants share the same contract: `open`, `close`, `restart` (close
//! then open, because some devices terminate long-lived connections
//! unilaterally), and `get_frame`, which yields one decoded frame plus its
//! wire byte length or a typed `StreamError`. Parsers own no scheduling
//! logic; the worker decides when to call them.

pub mod mjpeg;
pub mod playlist;
pub mod snapshot;

#[cfg(test)]
pub(crate) mod testserver;

use std::time::Duration;

use thiserror::Error;

use crate::camera::Camera;
use crate::frame::Frame;

pub use mjpeg::MjpegSource;
pub use playlist::PlaylistSource;
pub use snapshot::SnapshotSource;

/// Bound on every network request or read so one dead camera cannot stall a
/// whole shard's cadence.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Upper bound on a single frame payload. Devices occasionally advertise
/// absurd lengths in a mangled header; reading them would wedge the worker.
pub(crate) const MAX_FRAME_BYTES: usize = 8 * 1024 * 1024;

/// Per-camera, per-attempt failure taxonomy. All variants are non-fatal to
/// the run; the worker counts them toward retirement.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Network or transport failure, including timeouts and HTTP errors.
    #[error("camera unreachable: {0}")]
    Unreachable(String),
    /// A response arrived but its framing or image payload is invalid.
    #[error("corrupted frame: {0}")]
    CorruptedFrame(String),
    /// `get_frame` was called on a persistent source that was never opened.
    #[error("stream is not open")]
    ClosedStream,
}

impl StreamError {
    pub(crate) fn unreachable(cause: impl std::fmt::Display) -> Self {
        StreamError::Unreachable(cause.to_string())
    }

    pub(crate) fn corrupted(cause: impl std::fmt::Display) -> Self {
        StreamError::CorruptedFrame(cause.to_string())
    }
}

/// A camera's parser, selected once from its descriptor.
pub enum FrameSource {
    Snapshot(SnapshotSource),
    Mjpeg(MjpegSource),
    Playlist(PlaylistSource),
    #[cfg(test)]
    Scripted(ScriptedSource),
}

impl FrameSource {
    /// Resolve a descriptor to its parser. An IP camera uses the multipart
    /// stream path; with an empty `video_path` it degrades to snapshot
    /// polling of its image path.
    pub fn for_camera(camera: &Camera) -> FrameSource {
        match camera {
            Camera::NonIp { snapshot_url, .. } => {
                FrameSource::Snapshot(SnapshotSource::new(snapshot_url.clone()))
            }
            Camera::Ip {
                host,
                port,
                image_path,
                video_path,
                ..
            } => {
                if video_path.is_empty() {
                    let url = Camera::image_url(host, *port, image_path);
                    FrameSource::Snapshot(SnapshotSource::new(url))
                } else {
                    let url = Camera::video_url(host, *port, video_path);
                    FrameSource::Mjpeg(MjpegSource::new(url))
                }
            }
            Camera::Stream { m3u8_url, .. } => {
                FrameSource::Playlist(PlaylistSource::new(m3u8_url.clone()))
            }
        }
    }

    /// Open the underlying session. A no-op for stateless variants.
    pub fn open(&mut self) -> Result<(), StreamError> {
        match self {
            FrameSource::Snapshot(_) | FrameSource::Playlist(_) => Ok(()),
            FrameSource::Mjpeg(source) => source.open(),
            #[cfg(test)]
            FrameSource::Scripted(source) => source.open(),
        }
    }

    /// Release the underlying session. Closing a closed source is a no-op.
    pub fn close(&mut self) {
        match self {
            FrameSource::Snapshot(_) | FrameSource::Playlist(_) => {}
            FrameSource::Mjpeg(source) => source.close(),
            #[cfg(test)]
            FrameSource::Scripted(source) => source.close(),
        }
    }

    /// Close then open. Recovers from devices that drop long-lived
    /// connections without the caller having to re-resolve the camera.
    pub fn restart(&mut self) -> Result<(), StreamError> {
        self.close();
        self.open()
    }

    pub fn get_frame(&mut self) -> Result<Frame, StreamError> {
        match self {
            FrameSource::Snapshot(source) => source.get_frame(),
            FrameSource::Mjpeg(source) => source.get_frame(),
            FrameSource::Playlist(source) => source.get_frame(),
            #[cfg(test)]
            FrameSource::Scripted(source) => source.get_frame(),
        }
    }

    /// Whether this variant holds a live connection between calls.
    pub fn is_persistent(&self) -> bool {
        matches!(self, FrameSource::Mjpeg(_))
    }

    pub fn is_open(&self) -> bool {
        match self {
            FrameSource::Snapshot(_) | FrameSource::Playlist(_) => true,
            FrameSource::Mjpeg(source) => source.is_open(),
            #[cfg(test)]
            FrameSource::Scripted(source) => source.is_open(),
        }
    }
}

/// Scripted source for scheduler tests: replays a fixed list of outcomes and
/// records how often it was polled.
#[cfg(test)]
pub struct ScriptedSource {
    outcomes: Vec<ScriptedOutcome>,
    calls: std::sync::Arc<std::sync::atomic::AtomicUsize>,
    open: bool,
}

#[cfg(test)]
#[derive(Clone)]
pub enum ScriptedOutcome {
    Frame(image::RgbImage),
    Unreachable,
    Corrupted,
}

#[cfg(test)]
impl ScriptedSource {
    pub fn new(outcomes: Vec<ScriptedOutcome>) -> (Self, std::sync::Arc<std::sync::atomic::AtomicUsize>) {
        let calls = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        (
            Self {
                outcomes,
                calls: calls.clone(),
                open: false,
            },
            calls,
        )
    }

    fn open(&mut self) -> Result<(), StreamError> {
        self.open = true;
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn get_frame(&mut self) -> Result<Frame, StreamError> {
        let call = self
            .calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        match &self.outcomes[call % self.outcomes.len()] {
            ScriptedOutcome::Frame(image) => Ok(Frame::new(
                image::DynamicImage::ImageRgb8(image.clone()),
                image.as_raw().len(),
            )),
            ScriptedOutcome::Unreachable => Err(StreamError::unreachable("scripted outage")),
            ScriptedOutcome::Corrupted => Err(StreamError::corrupted("scripted garbage")),
        }
    }
}
