//! Direct-snapshot parser.
//!
//! The simplest camera kind: a URL that serves the most recent frame on
//! every GET. There is no session to manage, so `open` and `close` are
//! no-ops on this variant and every `get_frame` is one bounded request.

use std::io::Read;

use ureq::Agent;

use super::{StreamError, MAX_FRAME_BYTES, REQUEST_TIMEOUT};
use crate::frame::Frame;

pub struct SnapshotSource {
    url: String,
    agent: Agent,
}

impl SnapshotSource {
    pub fn new(url: String) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build();
        Self { url, agent }
    }

    /// Download and decode the most recent frame. The returned frame's
    /// `byte_len` is the response body length.
    pub fn get_frame(&mut self) -> Result<Frame, StreamError> {
        let response = self
            .agent
            .get(&self.url)
            .call()
            .map_err(StreamError::unreachable)?;

        let mut body = Vec::new();
        response
            .into_reader()
            .take(MAX_FRAME_BYTES as u64 + 1)
            .read_to_end(&mut body)
            .map_err(StreamError::unreachable)?;

        // Some cameras answer 200 with nothing in the body.
        if body.is_empty() {
            return Err(StreamError::corrupted("empty response body"));
        }
        if body.len() > MAX_FRAME_BYTES {
            return Err(StreamError::corrupted("snapshot exceeds frame size cap"));
        }

        let byte_len = body.len();
        // Covers devices that serve 1x1 placeholders or truncated payloads:
        // the decoder rejects them and the attempt counts as corrupted.
        let image = image::load_from_memory(&body).map_err(StreamError::corrupted)?;
        Ok(Frame::new(image, byte_len))
    }
}
