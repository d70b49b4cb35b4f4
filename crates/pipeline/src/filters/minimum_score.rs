//! Filter to drop weak predictions.
//!
//! The reconstruction gives every unvisited attraction a score, including
//! near-zero and negative ones. This filter cuts those off.

use crate::traits::Filter;
use anyhow::Result;
use model::{Candidate, UserContext};

/// Removes candidates whose predicted score is below a threshold.
pub struct MinimumScoreFilter {
    min_score: f64,
}

impl MinimumScoreFilter {
    /// Create a new MinimumScoreFilter.
    ///
    /// # Arguments
    /// * `min_score` - Lowest predicted score that is kept (inclusive)
    pub fn new(min_score: f64) -> Self {
        Self { min_score }
    }
}

impl Filter for MinimumScoreFilter {
    fn name(&self) -> &str {
        "MinimumScoreFilter"
    }

    fn apply(&self, candidates: Vec<Candidate>, _context: &UserContext) -> Result<Vec<Candidate>> {
        Ok(candidates
            .into_iter()
            .filter(|candidate| candidate.score >= self.min_score)
            .collect())
    }
}
