//! Error types for matrix building and factorization.

use data_loader::{AttractionId, UserId};
use thiserror::Error;

/// Errors raised by the recommendation model
///
/// None of these leave partial state behind: a failed build or fit simply
/// returns the error and the caller keeps whatever it had before.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Requested number of latent components doesn't fit the matrix
    #[error("Invalid rank {rank}: must satisfy 1 <= rank < min({rows}, {cols})")]
    InvalidRank {
        rank: usize,
        rows: usize,
        cols: usize,
    },

    /// Same (user, attraction) pair seen twice under `DuplicatePolicy::Reject`
    #[error("Duplicate rating for user {user_id} and attraction {attraction_id}")]
    DuplicateEntry {
        user_id: UserId,
        attraction_id: AttractionId,
    },

    /// Rating is NaN or infinite
    #[error("Invalid rating {value} for user {user_id} and attraction {attraction_id}")]
    InvalidRating {
        user_id: UserId,
        attraction_id: AttractionId,
        value: f64,
    },

    /// The SVD routine did not produce usable factors
    #[error("Decomposition failed: {0}")]
    Decomposition(String),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, ModelError>;
