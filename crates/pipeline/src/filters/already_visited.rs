//! Filter to remove attractions the user has already visited.
//!
//! This is always the first filter in the pipeline: a visited attraction
//! must never come back as a recommendation.

use crate::traits::Filter;
use anyhow::Result;
use model::{Candidate, UserContext};

/// Removes candidates the user rated above zero.
///
/// ## Algorithm
/// Uses the HashSet in UserContext.visited for O(1) lookups.
pub struct AlreadyVisitedFilter;

impl Filter for AlreadyVisitedFilter {
    fn name(&self) -> &str {
        "AlreadyVisitedFilter"
    }

    fn apply(&self, candidates: Vec<Candidate>, context: &UserContext) -> Result<Vec<Candidate>> {
        let filtered: Vec<Candidate> = candidates
            .into_iter()
            .filter(|candidate| !context.visited.contains(&candidate.attraction_id))
            .collect();
        Ok(filtered)
    }
}
