//! Grayscale pixel statistics used by blank page detection
//!
//! A rendered page is reduced to a single-channel 8-bit raster and every sample
//! is compared against two intensity levels: an exact white level and a lower
//! "near white" cutoff that absorbs anti-aliasing and light compression noise in
//! scanned documents.

use image::{DynamicImage, GrayImage};
use serde::Serialize;

/// Intensity levels that count as white
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WhiteLevels {
    /// Samples equal to this value are exactly white
    pub exact: u8,
    /// Samples at or above this value are near white
    pub near: u8,
}

impl WhiteLevels {
    pub const fn new(exact: u8, near: u8) -> Self {
        Self { exact, near }
    }

    /// `near` must not exceed `exact`
    pub fn is_valid(&self) -> bool {
        self.near <= self.exact
    }
}

impl Default for WhiteLevels {
    fn default() -> Self {
        Self {
            exact: 255,
            near: 250,
        }
    }
}

/// White pixel counts for a single raster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PixelStats {
    /// Samples equal to the exact white level
    pub exact_white: u64,
    /// Samples at or above the near white level
    pub near_white: u64,
    /// Total number of samples (width * height)
    pub total: u64,
}

impl PixelStats {
    /// Count white samples in a grayscale raster
    pub fn from_gray(image: &GrayImage, levels: WhiteLevels) -> Self {
        let mut stats = PixelStats {
            total: u64::from(image.width()) * u64::from(image.height()),
            ..Default::default()
        };

        for &sample in image.as_raw() {
            if sample == levels.exact {
                stats.exact_white += 1;
            }
            if sample >= levels.near {
                stats.near_white += 1;
            }
        }

        stats
    }

    /// Count white samples in any rendered image
    ///
    /// Color images are converted to luma, and an alpha channel is dropped
    /// before sampling since it does not change how white the page looks.
    pub fn from_image(image: &DynamicImage, levels: WhiteLevels) -> Self {
        Self::from_gray(&to_opaque_gray(image), levels)
    }

    /// Number of white samples
    ///
    /// The two counts overlap (an exact white sample is usually also near
    /// white), so they are combined with `max` rather than summed.
    pub fn white_count(&self) -> u64 {
        self.exact_white.max(self.near_white)
    }

    /// Fraction of white samples; a raster without pixels counts as fully white
    pub fn white_ratio(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.white_count() as f64 / self.total as f64
    }
}

/// Reduce an image to a single opaque grayscale channel
pub fn to_opaque_gray(image: &DynamicImage) -> GrayImage {
    match image {
        DynamicImage::ImageLuma8(gray) => gray.clone(),
        DynamicImage::ImageLumaA8(gray_alpha) => {
            // Keep the luma channel as-is, discarding alpha
            let (width, height) = gray_alpha.dimensions();
            let samples = gray_alpha.pixels().map(|p| p.0[0]).collect();
            GrayImage::from_raw(width, height, samples)
                .unwrap_or_else(|| GrayImage::new(width, height))
        }
        other => other.to_luma8(),
    }
}
