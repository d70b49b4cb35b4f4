//! The seam between the recommender and individual candidate filters.

use anyhow::Result;
use model::{Candidate, UserContext};

/// A step that removes candidates from a user's list.
///
/// Implementations receive the candidates in column order and must return the
/// survivors in that same relative order; ranking happens after filtering.
///
/// `Send + Sync` lets one recommender be shared by a session across threads.
pub trait Filter: Send + Sync {
    /// Short identifier used in debug logs
    fn name(&self) -> &str;

    /// Keep the candidates this filter accepts for `context.user_id`
    fn apply(&self, candidates: Vec<Candidate>, context: &UserContext) -> Result<Vec<Candidate>>;
}
