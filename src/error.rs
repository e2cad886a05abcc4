use thiserror::Error;

/// Errors produced while scoring a single image. A failure here never
/// invalidates the scorer itself; subsequent calls are unaffected.
#[derive(Debug, Error)]
pub enum NiqeError {
    #[error(
        "image {width}x{height} is too small for patch size {patch_size} \
         (both dimensions must exceed {})",
        2 * .patch_size + 1
    )]
    ImageTooSmall {
        width: usize,
        height: usize,
        patch_size: usize,
    },

    #[error("no automatic patch size fits a {width}x{height} image")]
    NoPatchSizeFits { width: usize, height: usize },

    #[error("only {patches} patch(es) extracted; sample covariance needs at least 2")]
    TooFewPatches { patches: usize },

    #[error("invalid population statistics: {0}")]
    BadParams(String),

    #[error("linear algebra failure: {0}")]
    Linalg(String),
}
