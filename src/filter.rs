//! Separable Gaussian filtering over 2-D intensity fields.
//!
//! The filter is applied as a correlation (no kernel flip) along each axis in
//! turn, which is O(H*W*k) instead of O(H*W*k^2) for the equivalent 2-D pass.
//! Pixels past the image border are treated as zero (constant extension); the
//! MSCN transform relies on the mean and mean-of-squares passes using the
//! exact same boundary handling.

use ndarray::Array2;

/// Build a 1-D Gaussian kernel of length `2 * half_width + 1`.
///
/// Weights are symmetric about the center and normalized to sum to 1.0.
pub fn gaussian_kernel(half_width: usize, sigma: f32) -> Vec<f32> {
    assert!(sigma > 0.0, "sigma must be positive");

    let mut weights = vec![0.0f32; 2 * half_width + 1];
    weights[half_width] = 1.0;
    let mut sum = 1.0f32;
    let sd = sigma * sigma;

    for i in 1..=half_width {
        let tail = (-0.5 * (i * i) as f32 / sd).exp();
        weights[half_width + i] = tail;
        weights[half_width - i] = tail;
        sum += 2.0 * tail;
    }
    for w in &mut weights {
        *w /= sum;
    }

    weights
}

/// Correlate `field` with `kernel` along one axis, zero-extended at the edges.
fn correlate_axis(field: &Array2<f32>, kernel: &[f32], vertical: bool) -> Array2<f32> {
    let radius = (kernel.len() / 2) as isize;
    let (h, w) = field.dim();
    let mut out = Array2::zeros((h, w));

    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0f32;
            for (k, &kv) in kernel.iter().enumerate() {
                let offset = k as isize - radius;
                let (sy, sx) = if vertical {
                    (y as isize + offset, x as isize)
                } else {
                    (y as isize, x as isize + offset)
                };
                if sy >= 0 && sx >= 0 && (sy as usize) < h && (sx as usize) < w {
                    acc += kv * field[[sy as usize, sx as usize]];
                }
            }
            out[[y, x]] = acc;
        }
    }

    out
}

/// Apply `kernel` along rows and then columns of `field`.
pub fn correlate_separable(field: &Array2<f32>, kernel: &[f32]) -> Array2<f32> {
    let tmp = correlate_axis(field, kernel, true);
    correlate_axis(&tmp, kernel, false)
}
