//! Ordered composition of [`Filter`]s.
//!
//! Filters run one after another; each sees only what the previous one kept.
//! The first filter that returns an error stops the run.

use crate::traits::Filter;
use anyhow::{Context, Result};
use model::{Candidate, UserContext};
use tracing::debug;

/// A sequence of candidate filters, built with [`FilterPipeline::add_filter`].
///
/// ## Usage
/// ```ignore
/// let pipeline = FilterPipeline::new()
///     .add_filter(AlreadyVisitedFilter)
///     .add_filter(MinimumScoreFilter::new(0.5));
///
/// let kept = pipeline.apply(candidates, &context)?;
/// ```
#[derive(Default)]
pub struct FilterPipeline {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterPipeline {
    /// A pipeline that passes every candidate through
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `filter`; it runs after every filter added before it
    pub fn add_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Filter names in the order they run
    pub fn filter_names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    /// Run every filter over `candidates` for the user in `context`.
    ///
    /// A failing filter's error is wrapped with the filter's name.
    pub fn apply(&self, candidates: Vec<Candidate>, context: &UserContext) -> Result<Vec<Candidate>> {
        self.filters.iter().try_fold(candidates, |current, filter| {
            let before = current.len();
            let kept = filter
                .apply(current, context)
                .with_context(|| format!("Filter {} failed", filter.name()))?;
            debug!(
                "{}: {} -> {} candidates for user {}",
                filter.name(),
                before,
                kept.len(),
                context.user_id
            );
            Ok(kept)
        })
    }
}
