use approx::assert_abs_diff_eq;
use image::{DynamicImage, GrayImage, Luma};

use niqe::{ModelParams, NiqeError, NiqeScorer, PatchSize, FEATURE_DIM};

fn identity_params() -> ModelParams {
    let pop_cov = (0..FEATURE_DIM)
        .map(|i| {
            (0..FEATURE_DIM)
                .map(|j| if i == j { 1.0 } else { 0.0 })
                .collect()
        })
        .collect();
    ModelParams::from_parts(vec![0.0; FEATURE_DIM], pop_cov).unwrap()
}

fn checkerboard(size: u32, cell: u32) -> DynamicImage {
    let img = GrayImage::from_fn(size, size, |x, y| {
        if (x / cell + y / cell) % 2 == 0 {
            Luma([200u8])
        } else {
            Luma([55u8])
        }
    });
    DynamicImage::ImageLuma8(img)
}

fn gradient(width: u32, height: u32) -> DynamicImage {
    let img = GrayImage::from_fn(width, height, |x, y| Luma([((x * 2 + y) % 256) as u8]));
    DynamicImage::ImageLuma8(img)
}

#[test]
fn score_is_finite_and_non_negative() {
    let scorer = NiqeScorer::new(identity_params()).unwrap();
    let score = scorer.score(&checkerboard(128, 8)).unwrap();
    assert!(score.is_finite());
    assert!(score >= 0.0);
}

#[test]
fn flat_image_score_is_stable() {
    // Numeric regression anchor. A constant image passes through the
    // half-resolution resample unchanged, so both scales reduce to the MSCN
    // transform of a flat field and the expected value does not depend on
    // resampler tap details. Pinned against this implementation with
    // identity population statistics; auto sizing picks 48 here, giving
    // four patches.
    let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(128, 128, Luma([128u8])));
    let scorer = NiqeScorer::new(identity_params()).unwrap();
    let score = scorer.score(&img).unwrap();
    assert_abs_diff_eq!(score, 1.0444944657404371, epsilon = 5e-3);
}

#[test]
fn same_image_scores_identically() {
    let scorer = NiqeScorer::new(identity_params()).unwrap();
    let img = gradient(96, 96);
    let a = scorer.score(&img).unwrap();
    let b = scorer.score(&img).unwrap();
    assert_eq!(a, b);
}

#[test]
fn rgb_input_is_converted_to_luminance() {
    let scorer = NiqeScorer::new(identity_params()).unwrap();
    let gray = gradient(96, 96);
    let rgb = DynamicImage::ImageRgb8(gray.to_rgb8());
    let a = scorer.score(&gray).unwrap();
    let b = scorer.score(&rgb).unwrap();
    // BT.601 weights on an already-gray image reproduce the gray values up
    // to rounding in the u8 round trip.
    assert_abs_diff_eq!(a, b, epsilon = 0.2);
}

#[test]
fn too_small_image_fails_with_typed_error() {
    let scorer = NiqeScorer::with_patch_size(identity_params(), PatchSize::Fixed(32)).unwrap();
    let err = scorer.score(&gradient(40, 40)).unwrap_err();
    assert!(matches!(err, NiqeError::ImageTooSmall { .. }));
}

#[test]
fn failure_does_not_poison_the_scorer() {
    let scorer = NiqeScorer::new(identity_params()).unwrap();
    assert!(scorer.score(&gradient(10, 10)).is_err());
    // The cached statistics and grid are untouched; scoring still works.
    let score = scorer.score(&gradient(96, 96)).unwrap();
    assert!(score.is_finite());
}

#[test]
fn different_patch_sizes_use_the_same_pipeline() {
    let img = checkerboard(120, 6);
    let auto = NiqeScorer::new(identity_params()).unwrap();
    let fixed = NiqeScorer::with_patch_size(identity_params(), PatchSize::Fixed(48)).unwrap();
    // 120 exceeds 2*48+1 but not 2*64+1, so auto resolves to 48 and both agree.
    assert_eq!(
        auto.score(&img).unwrap(),
        fixed.score(&img).unwrap()
    );
}
