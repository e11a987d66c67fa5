//! Playlist (`.m3u8`) parser.
//!
//! Deliberately stateless across calls: each `get_frame` opens a fresh
//! session against the playlist, reads one frame from the most recent
//! segment, and releases everything. Holding a seek position across polls is
//! unreliable with many camera encoders, so every call pays for a fresh
//! session instead.

use std::io::Read;

use ureq::Agent;
use url::Url;

use super::{StreamError, MAX_FRAME_BYTES, REQUEST_TIMEOUT};
use crate::frame::Frame;

/// Content length is not meaningfully knowable for this transport, so every
/// frame reports this fixed nominal size.
const NOMINAL_FRAME_LEN: usize = 1;

pub struct PlaylistSource {
    url: String,
    agent: Agent,
}

impl PlaylistSource {
    pub fn new(url: String) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build();
        Self { url, agent }
    }

    /// Fetch the playlist, pull its most recent media segment, and decode
    /// one frame from it.
    pub fn get_frame(&mut self) -> Result<Frame, StreamError> {
        let playlist = self.fetch(&self.url)?;
        let playlist =
            String::from_utf8(playlist).map_err(|_| StreamError::corrupted("playlist is not text"))?;

        let segment =
            latest_segment(&playlist).ok_or_else(|| StreamError::corrupted("playlist has no media segments"))?;
        let segment_url = Url::parse(&self.url)
            .and_then(|base| base.join(segment))
            .map_err(StreamError::corrupted)?;

        let payload = self.fetch(segment_url.as_str())?;
        if payload.is_empty() {
            return Err(StreamError::corrupted("empty media segment"));
        }
        let image = image::load_from_memory(&payload).map_err(StreamError::corrupted)?;
        Ok(Frame::new(image, NOMINAL_FRAME_LEN))
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>, StreamError> {
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(StreamError::unreachable)?;
        let mut body = Vec::new();
        response
            .into_reader()
            .take(MAX_FRAME_BYTES as u64)
            .read_to_end(&mut body)
            .map_err(StreamError::unreachable)?;
        Ok(body)
    }
}

/// The last non-comment entry: live playlists append, so the most recent
/// position is at the bottom.
fn latest_segment(playlist: &str) -> Option<&str> {
    playlist
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .last()
}
