//! Duplicate suppression.
//!
//! Many fleet cameras serve the same frame for minutes at a time; writing
//! every poll would fill the archive with copies. The filter compares each
//! candidate against the last frame accepted for the same camera and drops
//! candidates that barely differ.
//!
//! Metric: mean absolute per-channel RGB difference, normalized to a
//! percentage in [0, 100]. Identical frames score 0; inverting every pixel
//! scores 100. Frames with different dimensions score 100 outright, since a
//! resolution change is never a duplicate.

use image::RgbImage;

/// Threshold-based duplicate decision. The threshold is the configured
/// duplicate-difference percentage; scores strictly below it are duplicates.
#[derive(Clone, Copy, Debug)]
pub struct DuplicateFilter {
    threshold_percent: f64,
}

impl DuplicateFilter {
    pub fn new(threshold_percent: f64) -> Self {
        Self { threshold_percent }
    }

    /// Whether `candidate` is a duplicate of the previously accepted frame.
    /// Callers handle the no-previous-frame case (always accept) themselves.
    pub fn is_duplicate(&self, previous: &RgbImage, candidate: &RgbImage) -> bool {
        difference_percent(previous, candidate) < self.threshold_percent
    }
}

/// Normalized difference score in [0, 100].
pub fn difference_percent(a: &RgbImage, b: &RgbImage) -> f64 {
    if a.dimensions() != b.dimensions() {
        return 100.0;
    }
    let a = a.as_raw();
    let b = b.as_raw();
    if a.is_empty() {
        return 0.0;
    }
    let total: u64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| u64::from(x.abs_diff(*y)))
        .sum();
    total as f64 * 100.0 / (a.len() as f64 * 255.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn solid(width: u32, height: u32, pixel: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb(pixel))
    }

    #[test]
    fn identical_frames_score_zero_and_are_duplicates() {
        let a = solid(8, 8, [100, 150, 200]);
        let b = a.clone();
        assert_eq!(difference_percent(&a, &b), 0.0);
        // Below any positive threshold.
        assert!(DuplicateFilter::new(0.001).is_duplicate(&a, &b));
    }

    #[test]
    fn opposite_frames_score_one_hundred() {
        let a = solid(8, 8, [0, 0, 0]);
        let b = solid(8, 8, [255, 255, 255]);
        assert_eq!(difference_percent(&a, &b), 100.0);
        assert!(!DuplicateFilter::new(10.0).is_duplicate(&a, &b));
    }

    #[test]
    fn difference_above_threshold_is_accepted() {
        let a = solid(8, 8, [0, 0, 0]);
        // ~20% brightness shift on every channel.
        let b = solid(8, 8, [51, 51, 51]);
        let score = difference_percent(&a, &b);
        assert!((score - 20.0).abs() < 0.1);
        assert!(!DuplicateFilter::new(10.0).is_duplicate(&a, &b));
        assert!(DuplicateFilter::new(30.0).is_duplicate(&a, &b));
    }

    #[test]
    fn dimension_change_is_never_a_duplicate() {
        let a = solid(8, 8, [10, 10, 10]);
        let b = solid(4, 4, [10, 10, 10]);
        assert_eq!(difference_percent(&a, &b), 100.0);
        assert!(!DuplicateFilter::new(99.0).is_duplicate(&a, &b));
    }
}
