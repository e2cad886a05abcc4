//! Mean-Subtracted Contrast-Normalized (MSCN) coefficients and the circular
//! paired products derived from them.
//!
//! MSCN coefficients of natural images are well modeled by a generalized
//! Gaussian; distortions disturb that regularity, which is what the NIQE
//! features measure.

use ndarray::Array2;

use crate::filter::{correlate_separable, gaussian_kernel};

/// Stabilizing constant in the MSCN denominator.
pub const DEFAULT_C: f32 = 1.0;

/// Default local-statistics window: half-width 3, sigma 7/6.
pub fn default_window() -> Vec<f32> {
    gaussian_kernel(3, 7.0 / 6.0)
}

/// An MSCN-transformed field together with the local statistics it was
/// normalized by.
pub struct MscnField {
    pub coefficients: Array2<f32>,
    pub variance: Array2<f32>,
    pub mean: Array2<f32>,
}

/// Compute MSCN coefficients of `img`: `(img - mu) / (sigma + c)` where `mu`
/// and `sigma` are Gaussian-weighted local mean and standard deviation.
///
/// The local variance is `sqrt(|E[x^2] - E[x]^2|)`; the absolute value guards
/// against tiny negative results from floating-point cancellation.
pub fn mscn_transform(img: &Array2<f32>, c: f32, window: Option<&[f32]>) -> MscnField {
    let default;
    let window = match window {
        Some(w) => w,
        None => {
            default = default_window();
            &default
        }
    };

    let mean = correlate_separable(img, window);
    let mean_sq = correlate_separable(&(img * img), window);
    let variance = (&mean_sq - &(&mean * &mean)).mapv(|v| v.abs().sqrt());

    let denom = &variance + c;
    let coefficients = (img - &mean) / &denom;

    MscnField {
        coefficients,
        variance,
        mean,
    }
}

/// Copy of `field` circularly shifted down by `dy` and right by `dx`.
fn circular_shift(field: &Array2<f32>, dy: isize, dx: isize) -> Array2<f32> {
    let (h, w) = field.dim();
    Array2::from_shape_fn((h, w), |(y, x)| {
        let sy = (y as isize - dy).rem_euclid(h as isize) as usize;
        let sx = (x as isize - dx).rem_euclid(w as isize) as usize;
        field[[sy, sx]]
    })
}

/// Elementwise products of `field` with shifted copies of itself, in the
/// order horizontal, vertical, first diagonal (down-right), second diagonal
/// (down-left). Shifts wrap around the field boundary.
pub fn paired_products(field: &Array2<f32>) -> [Array2<f32>; 4] {
    let horizontal = circular_shift(field, 0, 1) * field;
    let vertical = circular_shift(field, 1, 0) * field;
    let diag1 = circular_shift(field, 1, 1) * field;
    let diag2 = circular_shift(field, 1, -1) * field;
    [horizontal, vertical, diag1, diag2]
}
