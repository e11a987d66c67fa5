//! Multipart live-stream parser.
//!
//! Classic `multipart/x-mixed-replace` framing: the device keeps one HTTP
//! connection open and writes frame units back to back, each one a strict
//! six-part sequence:
//!
//! ```text
//! --myboundary
//! Content-Type: image/jpeg
//! Content-Length: <payload bytes>
//! <blank line>
//! ..... binary payload .....
//! <blank line>
//! ```
//!
//! Any deviation fails the attempt as a corrupted frame, consuming only the
//! lines up to the deviation so the caller can decide to restart the stream.

use std::io::{BufRead, BufReader, Read};

use ureq::Agent;

use super::{StreamError, MAX_FRAME_BYTES, REQUEST_TIMEOUT};
use crate::frame::Frame;

const BOUNDARY: &str = "--myboundary";
const CONTENT_TYPE: &str = "Content-Type: image/jpeg";

type LiveStream = BufReader<Box<dyn Read + Send + Sync + 'static>>;

/// Persistent multipart session. Closed until `open` succeeds; the live
/// socket is released when the session is closed or the source is dropped,
/// however many frames were read.
pub struct MjpegSource {
    url: String,
    agent: Agent,
    stream: Option<LiveStream>,
}

impl MjpegSource {
    pub fn new(url: String) -> Self {
        // Per-read timeout rather than a whole-request deadline: the
        // connection is expected to stay open across many frames.
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(REQUEST_TIMEOUT)
            .timeout_read(REQUEST_TIMEOUT)
            .build();
        Self {
            url,
            agent,
            stream: None,
        }
    }

    /// Establish the long-lived connection.
    pub fn open(&mut self) -> Result<(), StreamError> {
        let response = self
            .agent
            .get(&self.url)
            .call()
            .map_err(StreamError::unreachable)?;
        self.stream = Some(BufReader::new(response.into_reader()));
        Ok(())
    }

    /// Release the live socket. A no-op when already closed.
    pub fn close(&mut self) {
        self.stream = None;
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Read the next frame unit from the live connection. Never opens
    /// implicitly: a closed session is a caller bug, reported as such.
    pub fn get_frame(&mut self) -> Result<Frame, StreamError> {
        let stream = self.stream.as_mut().ok_or(StreamError::ClosedStream)?;
        parse_frame_unit(stream)
    }
}

/// Parse one six-part frame unit from a multipart stream.
pub(crate) fn parse_frame_unit<R: BufRead>(reader: &mut R) -> Result<Frame, StreamError> {
    let line = read_line(reader)?;
    if line.trim_end() != BOUNDARY {
        return Err(StreamError::corrupted("boundary marker mismatch"));
    }

    let line = read_line(reader)?;
    if line.trim_end() != CONTENT_TYPE {
        return Err(StreamError::corrupted("content-type mismatch"));
    }

    let line = read_line(reader)?;
    let byte_len = parse_content_length(&line)?;
    if byte_len > MAX_FRAME_BYTES {
        return Err(StreamError::corrupted("content length exceeds frame cap"));
    }

    let line = read_line(reader)?;
    if !line.trim().is_empty() {
        return Err(StreamError::corrupted("missing separator before payload"));
    }

    let mut payload = vec![0u8; byte_len];
    reader
        .read_exact(&mut payload)
        .map_err(StreamError::unreachable)?;

    let line = read_line(reader)?;
    if !line.trim().is_empty() {
        return Err(StreamError::corrupted("missing separator after payload"));
    }

    let image = image::load_from_memory(&payload).map_err(StreamError::corrupted)?;
    Ok(Frame::new(image, byte_len))
}

/// `Content-Length: <digits>` with exactly one colon and an unsigned value.
fn parse_content_length(line: &str) -> Result<usize, StreamError> {
    let fields: Vec<&str> = line.split(':').map(str::trim).collect();
    if fields.len() != 2 || fields[0] != "Content-Length" {
        return Err(StreamError::corrupted("malformed content-length line"));
    }
    let value = fields[1];
    if value.is_empty() || !value.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(StreamError::corrupted(
            "content length is not an unsigned integer",
        ));
    }
    value.parse().map_err(StreamError::corrupted)
}

fn read_line<R: BufRead>(reader: &mut R) -> Result<String, StreamError> {
    let mut line = String::new();
    // EOF yields an empty line, which then fails the literal check above.
    reader
        .read_line(&mut line)
        .map_err(StreamError::unreachable)?;
    Ok(line)
}
