//! Natural Image Quality Evaluator (NIQE).
//!
//! A no-reference quality metric: images are reduced to statistics of local
//! luminance coefficients and scored by their Mahalanobis-like distance from
//! statistics pretrained on pristine natural images. Lower scores mean more
//! natural-looking.
//!
//! The pipeline flows strictly upward: separable Gaussian filter -> MSCN
//! transform -> paired products -> AGGD fits -> per-patch feature vectors at
//! two scales -> sample statistics -> scalar score.

pub mod aggd;
pub mod error;
pub mod features;
pub mod filter;
pub mod mscn;
pub mod params;
pub mod scorer;

pub use error::NiqeError;
pub use params::{ModelParams, FEATURE_DIM};
pub use scorer::{NiqeScorer, PatchSize};
