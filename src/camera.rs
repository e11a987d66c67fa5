//! Camera descriptors.
//!
//! A descriptor says how to reach one camera and which wire protocol it
//! speaks. Descriptors are immutable for the duration of a run and each one
//! resolves to exactly one parser variant; an unrecognized protocol tag in
//! manifest input is rejected at startup, never defaulted.

use serde::Deserialize;

/// How to reach one camera. The `id` doubles as the output directory name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Camera {
    /// A camera that serves its most recent frame at a fixed snapshot URL.
    NonIp { id: String, snapshot_url: String },
    /// An IP camera addressed by host/port with separate snapshot and
    /// multipart stream paths.
    Ip {
        id: String,
        host: String,
        port: Option<u16>,
        image_path: String,
        video_path: String,
    },
    /// A camera publishing a live playlist (`.m3u8`).
    Stream { id: String, m3u8_url: String },
}

impl Camera {
    pub fn id(&self) -> &str {
        match self {
            Camera::NonIp { id, .. } | Camera::Ip { id, .. } | Camera::Stream { id, .. } => id,
        }
    }

    /// Snapshot URL of an IP camera (`http://host[:port]<image_path>`).
    pub fn image_url(host: &str, port: Option<u16>, path: &str) -> String {
        match port {
            Some(port) => format!("http://{}:{}{}", host, port, path),
            None => format!("http://{}{}", host, path),
        }
    }

    /// Multipart stream URL of an IP camera (`http://host[:port]<video_path>`).
    pub fn video_url(host: &str, port: Option<u16>, path: &str) -> String {
        Self::image_url(host, port, path)
    }
}

/// Structured manifest record. The `type` tag selects the variant; anything
/// else fails deserialization, which the caller treats as a startup error.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum CameraRecord {
    NonIp {
        id: String,
        snapshot_url: String,
    },
    Ip {
        id: String,
        host: String,
        #[serde(default)]
        port: Option<u16>,
        image_path: String,
        video_path: String,
    },
    Stream {
        id: String,
        m3u8_url: String,
    },
}

impl From<CameraRecord> for Camera {
    fn from(record: CameraRecord) -> Self {
        match record {
            CameraRecord::NonIp { id, snapshot_url } => Camera::NonIp { id, snapshot_url },
            CameraRecord::Ip {
                id,
                host,
                port,
                image_path,
                video_path,
            } => Camera::Ip {
                id,
                host,
                port,
                image_path,
                video_path,
            },
            CameraRecord::Stream { id, m3u8_url } => Camera::Stream { id, m3u8_url },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ip_urls_include_optional_port() {
        assert_eq!(
            Camera::video_url("207.251.86.238", None, "/axis-cgi/mjpg/video.cgi"),
            "http://207.251.86.238/axis-cgi/mjpg/video.cgi"
        );
        assert_eq!(
            Camera::image_url("10.0.0.4", Some(8080), "/snap.jpg"),
            "http://10.0.0.4:8080/snap.jpg"
        );
    }

    #[test]
    fn record_with_known_tag_converts() {
        let json = r#"{"type": "stream", "id": "7", "m3u8_url": "http://cam/live.m3u8"}"#;
        let record: CameraRecord = serde_json::from_str(json).unwrap();
        let camera: Camera = record.into();
        assert_eq!(camera.id(), "7");
        assert!(matches!(camera, Camera::Stream { .. }));
    }

    #[test]
    fn record_with_unknown_tag_is_an_error() {
        let json = r#"{"type": "carrier_pigeon", "id": "1", "snapshot_url": "http://x"}"#;
        assert!(serde_json::from_str::<CameraRecord>(json).is_err());
    }
}
