//! Filter implementations for the candidate pipeline.
//!
//! This module contains all the concrete filter implementations
//! that can be composed into a FilterPipeline.

pub mod already_visited;
pub mod minimum_score;

// Re-export for convenience
pub use already_visited::AlreadyVisitedFilter;
pub use minimum_score::MinimumScoreFilter;
