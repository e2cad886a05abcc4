//! Per-patch NIQE feature extraction at two resolution scales.

use image::imageops::{self, FilterType};
use image::{ImageBuffer, Luma};
use ndarray::{concatenate, s, Array2, ArrayView2, Axis};
use rayon::prelude::*;

use crate::aggd::{fit_aggd, ShapeGrid};
use crate::error::NiqeError;
use crate::mscn::{mscn_transform, paired_products, DEFAULT_C};

/// Features per patch per scale.
pub const FEATURES_PER_SCALE: usize = 18;

/// AGGD features of one MSCN patch: the raw coefficients plus the four
/// paired-product fields, 18 values in total.
///
/// The D1/D2 right-scale slots repeat `left_beta`, matching the original
/// NIQE release; the published model parameters bake in that layout, so it
/// is kept verbatim.
pub fn subband_features(patch: &Array2<f32>, grid: &ShapeGrid) -> [f64; FEATURES_PER_SCALE] {
    let m = fit_aggd(patch.as_slice().expect("owned patches are contiguous"), grid);
    let [h, v, d1, d2] = paired_products(patch);
    let fh = fit_aggd(h.as_slice().expect("owned patches are contiguous"), grid);
    let fv = fit_aggd(v.as_slice().expect("owned patches are contiguous"), grid);
    let f1 = fit_aggd(d1.as_slice().expect("owned patches are contiguous"), grid);
    let f2 = fit_aggd(d2.as_slice().expect("owned patches are contiguous"), grid);

    [
        m.alpha,
        0.5 * (m.left_beta + m.right_beta),
        fh.alpha,
        fh.mean,
        fh.left_beta,
        fh.right_beta,
        fv.alpha,
        fv.mean,
        fv.left_beta,
        fv.right_beta,
        f1.alpha,
        f1.mean,
        f1.left_beta,
        f1.left_beta,
        f2.alpha,
        f2.mean,
        f2.left_beta,
        f2.left_beta,
    ]
}

/// Extract features from every complete `patch_size` x `patch_size` tile of
/// an MSCN field, left-to-right then top-to-bottom. Tiles that would extend
/// past the boundary are dropped.
///
/// Patches are independent, so they are fitted in parallel.
pub fn extract_patch_features(
    mscn: ArrayView2<'_, f32>,
    patch_size: usize,
    grid: &ShapeGrid,
) -> Array2<f64> {
    let (h, w) = mscn.dim();
    let mut origins = Vec::new();
    let mut y = 0;
    while y + patch_size <= h {
        let mut x = 0;
        while x + patch_size <= w {
            origins.push((y, x));
            x += patch_size;
        }
        y += patch_size;
    }

    let rows: Vec<[f64; FEATURES_PER_SCALE]> = origins
        .par_iter()
        .map(|&(y, x)| {
            let patch = mscn.slice(s![y..y + patch_size, x..x + patch_size]).to_owned();
            subband_features(&patch, grid)
        })
        .collect();

    let mut out = Array2::zeros((rows.len(), FEATURES_PER_SCALE));
    for (i, row) in rows.iter().enumerate() {
        for (j, &v) in row.iter().enumerate() {
            out[[i, j]] = v;
        }
    }
    out
}

/// Downscale an intensity field to half width and height with Catmull-Rom
/// (bicubic) interpolation.
///
/// Intensities are mapped into [0, 1] around the resize because the resampler
/// clamps float samples to that range.
pub fn half_resolution(img: &Array2<f32>) -> Array2<f32> {
    let (h, w) = img.dim();
    let data: Vec<f32> = img.iter().map(|&v| v / 255.0).collect();
    let buf = ImageBuffer::<Luma<f32>, Vec<f32>>::from_raw(w as u32, h as u32, data)
        .expect("buffer length matches dimensions");

    let resized = imageops::resize(&buf, (w / 2) as u32, (h / 2) as u32, FilterType::CatmullRom);

    let data: Vec<f32> = resized.into_raw().iter().map(|&v| v * 255.0).collect();
    Array2::from_shape_vec((h / 2, w / 2), data).expect("resize output dimensions")
}

/// Full two-scale feature matrix of a grayscale intensity image: one row per
/// patch, 36 columns.
///
/// The image is cropped so both dimensions divide evenly by `patch_size`,
/// MSCN-transformed at full and half resolution, and tiled at `patch_size`
/// and `patch_size / 2` respectively. The halving keeps the patch count
/// identical at both scales, so the two matrices concatenate row-for-row.
/// `patch_size` must be even and nonzero.
pub fn image_features(
    img: &Array2<f32>,
    patch_size: usize,
    grid: &ShapeGrid,
) -> Result<Array2<f64>, NiqeError> {
    let (h, w) = img.dim();
    if h < patch_size || w < patch_size {
        return Err(NiqeError::ImageTooSmall {
            width: w,
            height: h,
            patch_size,
        });
    }

    // Crop trailing rows/columns; never pad.
    let ch = h - h % patch_size;
    let cw = w - w % patch_size;
    let cropped = img.slice(s![..ch, ..cw]).to_owned();

    let half = half_resolution(&cropped);

    let full_mscn = mscn_transform(&cropped, DEFAULT_C, None);
    let half_mscn = mscn_transform(&half, DEFAULT_C, None);

    let full_feats = extract_patch_features(full_mscn.coefficients.view(), patch_size, grid);
    let half_feats = extract_patch_features(half_mscn.coefficients.view(), patch_size / 2, grid);

    let feats = concatenate(Axis(1), &[full_feats.view(), half_feats.view()])
        .expect("equal patch counts at both scales");
    Ok(feats)
}
