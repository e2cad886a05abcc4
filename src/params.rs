use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::NiqeError;

/// Length of the two-scale per-patch feature vector.
pub const FEATURE_DIM: usize = 36;

/// Pretrained population statistics: mean vector and covariance matrix of
/// NIQE features over a corpus of pristine natural images.
///
/// Loaded once and treated as immutable for the lifetime of a scorer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelParams {
    pub pop_mu: Vec<f64>,
    pub pop_cov: Vec<Vec<f64>>,
}

impl ModelParams {
    /// Build from in-memory arrays, validating dimensions.
    pub fn from_parts(pop_mu: Vec<f64>, pop_cov: Vec<Vec<f64>>) -> Result<Self, NiqeError> {
        let params = ModelParams { pop_mu, pop_cov };
        params.validate()?;
        Ok(params)
    }

    /// Load population statistics from a JSON file with `pop_mu` and
    /// `pop_cov` fields.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("read model parameters from {}", path.display()))?;
        let params: Self = serde_json::from_str(&contents)
            .with_context(|| format!("parse model parameters in {}", path.display()))?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), NiqeError> {
        if self.pop_mu.len() != FEATURE_DIM {
            return Err(NiqeError::BadParams(format!(
                "pop_mu has {} elements, expected {}",
                self.pop_mu.len(),
                FEATURE_DIM
            )));
        }
        if self.pop_cov.len() != FEATURE_DIM {
            return Err(NiqeError::BadParams(format!(
                "pop_cov has {} rows, expected {}",
                self.pop_cov.len(),
                FEATURE_DIM
            )));
        }
        for (i, row) in self.pop_cov.iter().enumerate() {
            if row.len() != FEATURE_DIM {
                return Err(NiqeError::BadParams(format!(
                    "pop_cov row {} has {} elements, expected {}",
                    i,
                    row.len(),
                    FEATURE_DIM
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_params() -> ModelParams {
        let pop_cov = (0..FEATURE_DIM)
            .map(|i| {
                (0..FEATURE_DIM)
                    .map(|j| if i == j { 1.0 } else { 0.0 })
                    .collect()
            })
            .collect();
        ModelParams {
            pop_mu: vec![0.0; FEATURE_DIM],
            pop_cov,
        }
    }

    #[test]
    fn valid_params_round_trip_through_json() {
        let params = identity_params();
        let json = serde_json::to_string(&params).unwrap();
        let parsed: ModelParams = serde_json::from_str(&json).unwrap();
        parsed.validate().unwrap();
        assert_eq!(parsed.pop_mu, params.pop_mu);
        assert_eq!(parsed.pop_cov, params.pop_cov);
    }

    #[test]
    fn wrong_mean_length_is_rejected() {
        let mut params = identity_params();
        params.pop_mu.pop();
        assert!(matches!(params.validate(), Err(NiqeError::BadParams(_))));
    }

    #[test]
    fn ragged_covariance_is_rejected() {
        let mut params = identity_params();
        params.pop_cov[7].push(0.0);
        assert!(matches!(params.validate(), Err(NiqeError::BadParams(_))));
    }
}
