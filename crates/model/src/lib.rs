//! # Model Crate
//!
//! The numerical half of the recommender.
//!
//! ## Components
//!
//! ### Matrix Builder (`matrix`)
//! Pivots transactions into a dense user × attraction rating matrix with an
//! explicit duplicate policy.
//!
//! ### Factorization Engine (`factorization`)
//! Truncated SVD of the rating matrix, exact or seeded-randomized, and the
//! reconstruction of predicted ratings.
//!
//! ### Trained model (`trained`)
//! The caller-owned handle produced by an explicit train step.
//!
//! ## Example Usage
//!
//! ```ignore
//! use model::{build_matrix, train, DuplicatePolicy, SvdConfig};
//!
//! let matrix = build_matrix(dataset.transactions(), DuplicatePolicy::Mean)?;
//! let model = train(&matrix, &SvdConfig::new(10))?;
//! let score = model.predicted().get(70456, 640);
//! ```

pub mod error;
pub mod factorization;
pub mod matrix;
pub mod trained;
pub mod types;
pub mod user_context;

pub use error::{ModelError, Result};
pub use factorization::{
    factorize, fit, validate_rank, LatentFactors, PredictedRatingMatrix, Solver, SvdConfig,
    DEFAULT_OVERSAMPLES, DEFAULT_POWER_ITERATIONS, DEFAULT_RANK, DEFAULT_SEED,
};
pub use matrix::{build_matrix, DuplicatePolicy, MatrixAxes, UserItemMatrix};
pub use trained::{train, TrainedModel};
pub use types::{Candidate, UserContext};
pub use user_context::build_user_context;
