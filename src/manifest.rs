//! Camera manifest input.
//!
//! Two supported shapes:
//! - a line-oriented file with one camera URL per line, where `.m3u8` URLs
//!   are playlist cameras and everything else is a direct snapshot camera;
//!   ids are assigned sequentially in file order starting at 1
//! - a JSON array of structured records, each carrying an explicit protocol
//!   tag and the fields that variant needs
//!
//! Malformed or missing manifest input is a startup error for the whole run,
//! never a per-camera skip.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::camera::{Camera, CameraRecord};

/// Read a line-oriented URL manifest. Blank lines are ignored.
pub fn read_url_manifest(path: &Path) -> Result<Vec<Camera>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read camera manifest {}", path.display()))?;
    Ok(classify_urls(raw.lines()))
}

/// Classify manifest URLs into descriptors, assigning ids `1..` in order.
pub fn classify_urls<'a>(urls: impl Iterator<Item = &'a str>) -> Vec<Camera> {
    urls.map(str::trim)
        .filter(|url| !url.is_empty())
        .enumerate()
        .map(|(index, url)| {
            let id = (index + 1).to_string();
            if url.ends_with(".m3u8") {
                Camera::Stream {
                    id,
                    m3u8_url: url.to_string(),
                }
            } else {
                Camera::NonIp {
                    id,
                    snapshot_url: url.to_string(),
                }
            }
        })
        .collect()
}

/// Read a JSON manifest of structured camera records.
pub fn read_record_manifest(path: &Path) -> Result<Vec<Camera>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read camera manifest {}", path.display()))?;
    parse_camera_records(&raw).with_context(|| format!("parse camera manifest {}", path.display()))
}

/// Parse a JSON array of tagged camera records. An unrecognized protocol tag
/// fails the whole manifest.
pub fn parse_camera_records(raw: &str) -> Result<Vec<Camera>> {
    let records: Vec<CameraRecord> =
        serde_json::from_str(raw).context("camera records must be a JSON array of tagged objects")?;
    Ok(records.into_iter().map(Camera::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn urls_classify_by_m3u8_suffix_with_sequential_ids() {
        let cameras = classify_urls(
            ["http://cam.example/live/stream.m3u8", "http://cam.example/snap.jpg"].into_iter(),
        );
        assert_eq!(cameras.len(), 2);
        assert_eq!(cameras[0].id(), "1");
        assert!(matches!(cameras[0], Camera::Stream { .. }));
        assert_eq!(cameras[1].id(), "2");
        assert!(matches!(cameras[1], Camera::NonIp { .. }));
    }

    #[test]
    fn blank_lines_do_not_consume_ids() {
        let cameras = classify_urls(["", "http://a/x.jpg", "  ", "http://b/y.jpg"].into_iter());
        assert_eq!(cameras.len(), 2);
        assert_eq!(cameras[0].id(), "1");
        assert_eq!(cameras[1].id(), "2");
    }

    #[test]
    fn missing_manifest_file_is_a_startup_error() {
        assert!(read_url_manifest(Path::new("/nonexistent/cameras.txt")).is_err());
    }

    #[test]
    fn url_manifest_file_round_trips() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "http://cam.example/live.m3u8").unwrap();
        writeln!(file, "http://cam.example/frame.jpg").unwrap();
        let cameras = read_url_manifest(file.path()).unwrap();
        assert_eq!(cameras.len(), 2);
        assert!(matches!(cameras[0], Camera::Stream { .. }));
    }

    #[test]
    fn record_manifest_parses_all_variants() {
        let raw = r#"[
            {"type": "non_ip", "id": "3028", "snapshot_url": "http://images.example/preview.jpg"},
            {"type": "ip", "id": "30288", "host": "207.251.86.238",
             "image_path": "/cctv290.jpg", "video_path": "/axis-cgi/mjpg/video.cgi"},
            {"type": "stream", "id": "9", "m3u8_url": "http://cam.example/live.m3u8"}
        ]"#;
        let cameras = parse_camera_records(raw).unwrap();
        assert_eq!(cameras.len(), 3);
        assert!(matches!(cameras[1], Camera::Ip { .. }));
    }

    #[test]
    fn unknown_protocol_tag_fails_the_manifest() {
        let raw = r#"[{"type": "telepathic", "id": "1"}]"#;
        assert!(parse_camera_records(raw).is_err());
    }
}
