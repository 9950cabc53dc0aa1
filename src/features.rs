//! Default [`FeatureExtractor`] comparing two photographs pixel by pixel.
//!
//! Both images are decoded, converted to 8-bit luma and resampled onto the
//! same square grid, so pairs of different sizes remain comparable. The
//! resulting vector has [`FEATURE_COUNT`] entries, in this order:
//!
//! 0. mean brightness of the start image
//! 1. mean brightness of the end image
//! 2. mean absolute difference
//! 3. standard deviation of the signed difference
//! 4. fraction of changed pixels
//! 5. horizontal centroid of the changed region
//! 6. vertical centroid of the changed region
//! 7. signed brightness shift (end minus start)
//!
//! All values are normalized to `[0, 1]`, except the shift which lies in
//! `[-1, 1]`.

use image::{GrayImage, imageops::FilterType};

use crate::{
    model::{FeatureExtractor, FeatureVector},
    store::Role,
};

/// Number of values produced by [`DiffFeatureExtractor`].
pub const FEATURE_COUNT: usize = 8;

const DEFAULT_GRID: u32 = 64;
const MAX_GRID: u32 = 1024;
const DEFAULT_CHANGE_THRESHOLD: u8 = 25;

/// Errors from [`DiffFeatureExtractor`].
#[derive(Debug, thiserror::Error)]
pub enum FeatureError {
    /// The bytes for `role` are not a supported image.
    #[error("cannot decode the {} image", .role.tag())]
    Decode {
        role: Role,
        #[source]
        source: image::ImageError,
    },
}

/// Pixel-difference feature extractor.
#[derive(Clone, Debug)]
pub struct DiffFeatureExtractor {
    grid: u32,
    change_threshold: u8,
}

impl Default for DiffFeatureExtractor {
    fn default() -> Self {
        Self {
            grid: DEFAULT_GRID,
            change_threshold: DEFAULT_CHANGE_THRESHOLD,
        }
    }
}

impl DiffFeatureExtractor {
    /// Extractor with a 64x64 grid and a change threshold of 25.
    pub fn new() -> Self {
        Self::default()
    }

    /// Side length of the comparison grid, clamped to `1..=1024`.
    pub fn with_grid(mut self, grid: u32) -> Self {
        self.grid = grid.clamp(1, MAX_GRID);
        self
    }

    /// Minimum absolute luma change (0-255) for a pixel to count as changed.
    pub fn with_change_threshold(mut self, threshold: u8) -> Self {
        self.change_threshold = threshold;
        self
    }

    fn decode(&self, role: Role, bytes: &[u8]) -> Result<GrayImage, FeatureError> {
        let img = image::load_from_memory(bytes)
            .map_err(|source| FeatureError::Decode { role, source })?;
        Ok(img
            .resize_exact(self.grid, self.grid, FilterType::Triangle)
            .to_luma8())
    }
}

impl FeatureExtractor for DiffFeatureExtractor {
    type Error = FeatureError;

    fn extract(&self, start: &[u8], end: &[u8]) -> Result<FeatureVector, Self::Error> {
        let start = self.decode(Role::Start, start)?;
        let end = self.decode(Role::End, end)?;

        let n = self.grid as f64 * self.grid as f64;
        let mut sum_start = 0.0;
        let mut sum_end = 0.0;
        let mut sum_diff = 0.0;
        let mut sum_diff_sq = 0.0;
        let mut sum_abs = 0.0;
        let mut changed = 0usize;
        let (mut mass, mut mass_x, mut mass_y) = (0.0, 0.0, 0.0);

        for (x, y, s) in start.enumerate_pixels() {
            let s = s.0[0];
            let e = end.get_pixel(x, y).0[0];
            let diff = (e as f64 - s as f64) / 255.0;

            sum_start += s as f64 / 255.0;
            sum_end += e as f64 / 255.0;
            sum_diff += diff;
            sum_diff_sq += diff * diff;
            sum_abs += diff.abs();

            if s.abs_diff(e) > self.change_threshold {
                changed += 1;
                let weight = diff.abs();
                mass += weight;
                mass_x += weight * (x as f64 + 0.5) / self.grid as f64;
                mass_y += weight * (y as f64 + 0.5) / self.grid as f64;
            }
        }

        let mean_diff = sum_diff / n;
        let variance = (sum_diff_sq / n - mean_diff * mean_diff).max(0.0);
        let (centroid_x, centroid_y) = if mass > 0.0 {
            (mass_x / mass, mass_y / mass)
        } else {
            (0.5, 0.5)
        };

        let values = [
            sum_start / n,
            sum_end / n,
            sum_abs / n,
            variance.sqrt(),
            changed as f64 / n,
            centroid_x,
            centroid_y,
            mean_diff,
        ];

        Ok(FeatureVector::new(
            values.iter().map(|v| *v as f32).collect(),
        ))
    }
}
