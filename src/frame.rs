//! Decoded frames and their persistence.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use image::{DynamicImage, ImageFormat};

/// One decoded image captured from a camera, together with the raw byte
/// length of the wire payload it was decoded from. Frames are never mutated;
/// they are persisted once or discarded.
#[derive(Debug)]
pub struct Frame {
    pub image: DynamicImage,
    pub byte_len: usize,
}

impl Frame {
    pub fn new(image: DynamicImage, byte_len: usize) -> Self {
        Self { image, byte_len }
    }

    /// Write the frame as a JPEG file. The caller picks the path; directories
    /// must already exist.
    pub fn save_jpeg(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("create frame file {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        // JPEG has no alpha; normalize to RGB before encoding.
        self.image
            .to_rgb8()
            .write_to(&mut writer, ImageFormat::Jpeg)
            .with_context(|| format!("encode frame to {}", path.display()))?;
        Ok(())
    }
}

/// Filename for a frame captured now: zero-padded epoch milliseconds, so the
/// directory listing sorts in capture order.
pub fn timestamp_filename() -> PathBuf {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or(0);
    PathBuf::from(format!("{:015}.jpg", millis))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn save_jpeg_writes_a_decodable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.jpg");
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, image::Rgb([10, 200, 30])));
        let frame = Frame::new(image, 1234);
        frame.save_jpeg(&path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(image::load_from_memory(&bytes).is_ok());
    }

    #[test]
    fn timestamp_filenames_sort_in_capture_order() {
        let first = timestamp_filename();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = timestamp_filename();
        assert!(first < second);
    }
}
