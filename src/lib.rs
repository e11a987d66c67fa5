//! Camera fleet frame archiver.
//!
//! This crate polls a heterogeneous fleet of network cameras over three wire
//! protocols, discards near-duplicate frames, and persists the remainder to
//! per-camera directories. Unreachable or misbehaving devices are tolerated
//! for the whole run: failures are counted per camera and repeat offenders
//! are retired from their shard without aborting anything else.
//!
//! # Module Structure
//!
//! - `camera`: camera descriptors (one descriptor resolves to exactly one parser)
//! - `stream`: the three frame-source parsers (snapshot, multipart, playlist)
//! - `filter`: duplicate suppression against the last accepted frame
//! - `worker`: per-shard fixed-cadence poll loop with failure retirement
//! - `archiver`: sharding, staggered worker launch, join-all orchestration
//! - `manifest`: camera manifest input (URL list or structured records)
//! - `config`: immutable run configuration threaded into every worker

pub mod archiver;
pub mod camera;
pub mod config;
pub mod filter;
pub mod frame;
pub mod manifest;
pub mod stream;
pub mod worker;

pub use archiver::Archiver;
pub use camera::Camera;
pub use config::RunConfig;
pub use filter::DuplicateFilter;
pub use frame::Frame;
pub use stream::{FrameSource, StreamError};
pub use worker::CameraWorker;
