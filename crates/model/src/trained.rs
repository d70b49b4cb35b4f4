//! The trained-model handle.
//!
//! Training is expensive and only happens on request. The result is handed
//! back to the caller as a [`TrainedModel`] value, which the caller keeps and
//! passes to every recommend call. There is no process-wide model cache.

use crate::error::Result;
use crate::factorization::{fit, LatentFactors, PredictedRatingMatrix, SvdConfig};
use crate::matrix::UserItemMatrix;
use std::time::Instant;
use tracing::info;

/// Factors plus dense predictions for one (matrix snapshot, config) pair
#[derive(Debug, Clone)]
pub struct TrainedModel {
    config: SvdConfig,
    fingerprint: u64,
    factors: LatentFactors,
    predicted: PredictedRatingMatrix,
}

impl TrainedModel {
    pub fn config(&self) -> &SvdConfig {
        &self.config
    }

    /// Fingerprint of the rating matrix this model was trained on
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    pub fn factors(&self) -> &LatentFactors {
        &self.factors
    }

    pub fn predicted(&self) -> &PredictedRatingMatrix {
        &self.predicted
    }

    /// Whether training `matrix` with `config` again would give this exact model
    pub fn is_trained_on(&self, matrix: &UserItemMatrix, config: &SvdConfig) -> bool {
        self.config == *config && self.fingerprint == matrix.fingerprint()
    }
}

/// Factorize `matrix` and materialize the predicted-rating matrix.
///
/// Safe to call repeatedly: identical input and config give identical models.
pub fn train(matrix: &UserItemMatrix, config: &SvdConfig) -> Result<TrainedModel> {
    let start = Instant::now();

    let factors = fit(matrix, config)?;
    let predicted = factors.reconstruct();

    let (rows, cols) = matrix.shape();
    info!(
        "Trained rank-{} {:?} model on {}x{} matrix in {:.2?}",
        config.rank,
        config.solver,
        rows,
        cols,
        start.elapsed()
    );

    Ok(TrainedModel {
        config: config.clone(),
        fingerprint: matrix.fingerprint(),
        factors,
        predicted,
    })
}
