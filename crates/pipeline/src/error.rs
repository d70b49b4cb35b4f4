//! Error types for the recommendation step.

use thiserror::Error;

/// Errors returned by [`crate::Recommender::recommend`]
///
/// An unknown user is not an error: `recommend` returns `Ok(None)` for it.
#[derive(Error, Debug)]
pub enum RecommendError {
    /// No predicted-rating matrix was supplied; train first
    #[error("Model has not been trained yet")]
    ModelNotTrained,

    /// The predicted matrix was built from a different rating matrix
    #[error(
        "Predicted matrix ({pred_rows}x{pred_cols}) does not match the rating matrix ({rows}x{cols}); retrain the model"
    )]
    StaleModel {
        rows: usize,
        cols: usize,
        pred_rows: usize,
        pred_cols: usize,
    },

    /// A filter in the pipeline failed
    #[error(transparent)]
    Filter(#[from] anyhow::Error),
}
