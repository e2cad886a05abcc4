//! Asymmetric generalized Gaussian distribution (AGGD) parameter estimation.
//!
//! The shape parameter is estimated by nearest-neighbor lookup over a dense
//! precomputed grid instead of an iterative solver. The published NIQE model
//! parameters were trained against exactly this approximation, so the grid
//! range, step and ratio formula must not change.

use libm::tgamma;

/// Inclusive lower bound of the candidate shape grid.
pub const GRID_START: f64 = 0.2;
/// Exclusive upper bound of the candidate shape grid.
pub const GRID_END: f64 = 10.0;
/// Grid step; resolution of the shape estimate.
pub const GRID_STEP: f64 = 0.001;

/// Dense lookup table of candidate AGGD shape parameters and their
/// theoretical moment ratio `gamma(2/a)^2 / (gamma(1/a) * gamma(3/a))`.
///
/// Built once and shared read-only across every fit.
pub struct ShapeGrid {
    alphas: Vec<f64>,
    ratios: Vec<f64>,
}

impl ShapeGrid {
    pub fn new() -> Self {
        let count = ((GRID_END - GRID_START) / GRID_STEP).ceil() as usize;
        let mut alphas = Vec::with_capacity(count);
        let mut ratios = Vec::with_capacity(count);
        for i in 0..count {
            let a = GRID_START + i as f64 * GRID_STEP;
            let g2 = tgamma(2.0 / a);
            alphas.push(a);
            ratios.push(g2 * g2 / (tgamma(1.0 / a) * tgamma(3.0 / a)));
        }
        ShapeGrid { alphas, ratios }
    }

    pub fn len(&self) -> usize {
        self.alphas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alphas.is_empty()
    }

    /// Shape parameter whose ratio is closest (minimum squared difference)
    /// to `rhat_norm`.
    ///
    /// A non-finite `rhat_norm` makes every candidate distance non-finite;
    /// the strict comparison then keeps the first grid entry, matching the
    /// argmin convention of the reference model.
    pub fn nearest(&self, rhat_norm: f64) -> f64 {
        let mut best = 0;
        let mut best_dist = (self.ratios[0] - rhat_norm) * (self.ratios[0] - rhat_norm);
        for (i, r) in self.ratios.iter().enumerate().skip(1) {
            let dist = (r - rhat_norm) * (r - rhat_norm);
            if dist < best_dist {
                best_dist = dist;
                best = i;
            }
        }
        self.alphas[best]
    }

    #[cfg(test)]
    pub(crate) fn ratio_for(alpha: f64) -> f64 {
        let g2 = tgamma(2.0 / alpha);
        g2 * g2 / (tgamma(1.0 / alpha) * tgamma(3.0 / alpha))
    }
}

impl Default for ShapeGrid {
    fn default() -> Self {
        Self::new()
    }
}

/// Estimated AGGD parameters for one scalar field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggdFit {
    /// Shape parameter, always taken from the grid.
    pub alpha: f64,
    /// Mean shift between the two sides.
    pub mean: f64,
    /// Left scale term.
    pub left_beta: f64,
    /// Right scale term.
    pub right_beta: f64,
    /// Root-mean-square of the strictly negative samples, 0 if none.
    pub left_scale: f64,
    /// Root-mean-square of the non-negative samples, 0 if none.
    pub right_scale: f64,
}

/// Fit an AGGD to a flattened scalar field.
///
/// Degenerate inputs (one empty side, all-zero field) never divide by zero:
/// the affected ratios become infinite by convention and the grid search
/// still returns a finite shape.
pub fn fit_aggd(samples: &[f32], grid: &ShapeGrid) -> AggdFit {
    debug_assert!(!samples.is_empty());

    let mut left_sq_sum = 0.0f64;
    let mut left_count = 0usize;
    let mut right_sq_sum = 0.0f64;
    let mut right_count = 0usize;
    let mut abs_sum = 0.0f64;

    for &v in samples {
        let v = v as f64;
        let sq = v * v;
        if v < 0.0 {
            left_sq_sum += sq;
            left_count += 1;
        } else {
            right_sq_sum += sq;
            right_count += 1;
        }
        abs_sum += v.abs();
    }

    let n = samples.len() as f64;
    let left_scale = if left_count > 0 {
        (left_sq_sum / left_count as f64).sqrt()
    } else {
        0.0
    };
    let right_scale = if right_count > 0 {
        (right_sq_sum / right_count as f64).sqrt()
    } else {
        0.0
    };

    let gamma_hat = if right_scale != 0.0 {
        left_scale / right_scale
    } else {
        f64::INFINITY
    };

    let mean_sq = (left_sq_sum + right_sq_sum) / n;
    let r_hat = if mean_sq != 0.0 {
        let abs_mean = abs_sum / n;
        abs_mean * abs_mean / mean_sq
    } else {
        f64::INFINITY
    };

    let gh2 = gamma_hat * gamma_hat;
    let rhat_norm = r_hat * ((gh2 * gamma_hat + 1.0) * (gamma_hat + 1.0)) / ((gh2 + 1.0) * (gh2 + 1.0));

    let alpha = grid.nearest(rhat_norm);

    let gam1 = tgamma(1.0 / alpha);
    let gam2 = tgamma(2.0 / alpha);
    let gam3 = tgamma(3.0 / alpha);

    let aggd_ratio = gam1.sqrt() / gam3.sqrt();
    let left_beta = aggd_ratio * left_scale;
    let right_beta = aggd_ratio * right_scale;
    let mean = (right_beta - left_beta) * (gam2 / gam1);

    AggdFit {
        alpha,
        mean,
        left_beta,
        right_beta,
        left_scale,
        right_scale,
    }
}
