//! The NIQE scorer: per-image feature statistics against pretrained
//! population statistics.

use std::str::FromStr;

use image::DynamicImage;
use log::debug;
use nalgebra::{DMatrix, DVector};
use ndarray::{Array2, Axis};

use crate::aggd::ShapeGrid;
use crate::error::NiqeError;
use crate::features::image_features;
use crate::params::{ModelParams, FEATURE_DIM};

/// Candidate patch sizes for automatic selection, largest first.
pub const AUTO_PATCH_SIZES: [usize; 6] = [96, 64, 48, 32, 16, 8];

/// Patch-size policy for a scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchSize {
    /// Pick the largest candidate that fits the image.
    Auto,
    /// Always use this size. Must be even and nonzero so that the
    /// half-resolution pass tiles with the same patch count.
    Fixed(usize),
}

impl FromStr for PatchSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("auto") {
            return Ok(PatchSize::Auto);
        }
        s.parse::<usize>()
            .map(PatchSize::Fixed)
            .map_err(|_| format!("expected \"auto\" or a number, got {:?}", s))
    }
}

/// Largest auto candidate such that both dimensions exceed `2 * size + 1`.
pub fn auto_patch_size(width: usize, height: usize) -> Option<usize> {
    AUTO_PATCH_SIZES
        .iter()
        .copied()
        .find(|&size| width > 2 * size + 1 && height > 2 * size + 1)
}

/// Convert any decoded image to BT.601 luminance intensities in [0, 255].
pub fn to_luma_f32(img: &DynamicImage) -> Array2<f32> {
    if let DynamicImage::ImageLuma8(gray) = img {
        let (w, h) = gray.dimensions();
        return Array2::from_shape_fn((h as usize, w as usize), |(y, x)| {
            gray.get_pixel(x as u32, y as u32)[0] as f32
        });
    }

    let rgb = img.to_rgb8();
    let (w, h) = rgb.dimensions();
    Array2::from_shape_fn((h as usize, w as usize), |(y, x)| {
        let p = rgb.get_pixel(x as u32, y as u32);
        0.299 * p[0] as f32 + 0.587 * p[1] as f32 + 0.114 * p[2] as f32
    })
}

/// Scores images against a fixed set of population statistics.
///
/// Construction validates the statistics and builds the shape grid once;
/// scoring itself is pure and safe to call from multiple threads.
pub struct NiqeScorer {
    params: ModelParams,
    grid: ShapeGrid,
    patch_size: PatchSize,
}

impl NiqeScorer {
    pub fn new(params: ModelParams) -> Result<Self, NiqeError> {
        Self::with_patch_size(params, PatchSize::Auto)
    }

    pub fn with_patch_size(params: ModelParams, patch_size: PatchSize) -> Result<Self, NiqeError> {
        params.validate()?;
        if let PatchSize::Fixed(size) = patch_size {
            if size == 0 || size % 2 != 0 {
                return Err(NiqeError::BadParams(format!(
                    "patch size must be even and nonzero, got {}",
                    size
                )));
            }
        }
        Ok(NiqeScorer {
            params,
            grid: ShapeGrid::new(),
            patch_size,
        })
    }

    /// Score a decoded image; 3-channel input is converted to luminance.
    pub fn score(&self, img: &DynamicImage) -> Result<f64, NiqeError> {
        self.score_gray(&to_luma_f32(img))
    }

    /// Score a grayscale intensity field. Lower means more natural-looking.
    pub fn score_gray(&self, img: &Array2<f32>) -> Result<f64, NiqeError> {
        let (height, width) = img.dim();

        let patch_size = match self.patch_size {
            PatchSize::Auto => auto_patch_size(width, height)
                .ok_or(NiqeError::NoPatchSizeFits { width, height })?,
            PatchSize::Fixed(size) => size,
        };
        if width <= 2 * patch_size + 1 || height <= 2 * patch_size + 1 {
            return Err(NiqeError::ImageTooSmall {
                width,
                height,
                patch_size,
            });
        }
        debug!("scoring {}x{} image with patch size {}", width, height, patch_size);

        let feats = image_features(img, patch_size, &self.grid)?;
        let patches = feats.nrows();
        if patches < 2 {
            return Err(NiqeError::TooFewPatches { patches });
        }
        debug!("extracted {} patch feature vectors", patches);

        let sample_mu = feats.mean_axis(Axis(0)).expect("non-empty feature matrix");
        let centered = &feats - &sample_mu;
        let sample_cov = centered.t().dot(&centered) / (patches as f64 - 1.0);

        let diff = DVector::from_iterator(
            FEATURE_DIM,
            sample_mu
                .iter()
                .zip(&self.params.pop_mu)
                .map(|(s, p)| s - p),
        );
        let cov_avg = DMatrix::from_fn(FEATURE_DIM, FEATURE_DIM, |i, j| {
            0.5 * (self.params.pop_cov[i][j] + sample_cov[[i, j]])
        });

        // The sample covariance is rank-deficient whenever the patch count is
        // below the feature dimension, so a pseudo-inverse stands in for a
        // plain inverse. Singular values below max(dim) * eps * sigma_max are
        // truncated.
        let svd = cov_avg.svd(true, true);
        let sigma_max = svd.singular_values.iter().cloned().fold(0.0f64, f64::max);
        let tolerance = sigma_max * FEATURE_DIM as f64 * f64::EPSILON;
        let pinv = svd
            .pseudo_inverse(tolerance)
            .map_err(|e| NiqeError::Linalg(e.to_string()))?;

        let quad = (diff.transpose() * &pinv * &diff)[(0, 0)];
        // Rounding can push the quadratic form a hair below zero.
        Ok(if quad > 0.0 { quad.sqrt() } else { 0.0 })
    }
}
