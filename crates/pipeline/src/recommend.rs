//! Recommender - rank a user's unvisited attractions by predicted score.
//!
//! ## Algorithm
//! 1. Check a predicted matrix exists and lines up with the rating matrix
//! 2. Look up the user's row; unknown users get "no result"
//! 3. Turn the predicted row into candidates (column order)
//! 4. Run the filter pipeline (visited attractions always removed)
//! 5. Stable sort by score, descending, and keep the first `top_n`
//!
//! Ties keep column order, i.e. the smaller AttractionId comes first.

use crate::error::RecommendError;
use crate::filter_pipeline::FilterPipeline;
use crate::filters::{AlreadyVisitedFilter, MinimumScoreFilter};
use crate::traits::Filter;
use data_loader::{AttractionId, Dataset, UserId};
use model::{build_user_context, Candidate, PredictedRatingMatrix, UserItemMatrix};
use serde::Serialize;
use tracing::{debug, instrument};

/// Number of recommendations returned when the caller doesn't say
pub const DEFAULT_TOP_N: usize = 5;

/// A ranked recommendation with its display name attached
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttractionRecommendation {
    pub attraction_id: AttractionId,
    pub score: f64,
    /// `None` when the item table has no row for this attraction
    pub name: Option<String>,
}

/// Ranks unvisited attractions for a user.
///
/// ## Usage
/// ```ignore
/// let recommender = Recommender::new().with_min_score(0.1);
/// let top = recommender.recommend(user_id, &matrix, Some(model.predicted()), 5)?;
/// ```
pub struct Recommender {
    pipeline: FilterPipeline,
}

impl Recommender {
    /// Recommender with only the visited-attraction filter
    pub fn new() -> Self {
        Self {
            pipeline: FilterPipeline::new().add_filter(AlreadyVisitedFilter),
        }
    }

    /// Also drop candidates scoring below `min_score`
    pub fn with_min_score(self, min_score: f64) -> Self {
        self.with_filter(MinimumScoreFilter::new(min_score))
    }

    /// Append a custom filter after the built-in ones
    pub fn with_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.pipeline = self.pipeline.add_filter(filter);
        self
    }

    pub fn filter_names(&self) -> Vec<&str> {
        self.pipeline.filter_names()
    }

    /// Top-`top_n` unvisited attractions for `user_id`, best first.
    ///
    /// # Returns
    /// * `Ok(None)` - the user has no row in `matrix`
    /// * `Ok(Some(vec))` - at most `top_n` candidates (possibly empty)
    ///
    /// # Errors
    /// * `ModelNotTrained` - `predicted` is `None`
    /// * `StaleModel` - `predicted` belongs to another rating matrix
    #[instrument(skip(self, matrix, predicted))]
    pub fn recommend(
        &self,
        user_id: UserId,
        matrix: &UserItemMatrix,
        predicted: Option<&PredictedRatingMatrix>,
        top_n: usize,
    ) -> Result<Option<Vec<Candidate>>, RecommendError> {
        let predicted = predicted.ok_or(RecommendError::ModelNotTrained)?;
        if !predicted.matches(matrix) {
            let (rows, cols) = matrix.shape();
            let (pred_rows, pred_cols) = predicted.shape();
            return Err(RecommendError::StaleModel {
                rows,
                cols,
                pred_rows,
                pred_cols,
            });
        }

        let Some(context) = build_user_context(matrix, user_id) else {
            debug!("User {} is not in the rating matrix", user_id);
            return Ok(None);
        };
        let Some(scores) = predicted.user_row(user_id) else {
            return Ok(None);
        };

        let candidates: Vec<Candidate> = scores
            .into_iter()
            .map(|(attraction_id, score)| Candidate::new(attraction_id, score))
            .collect();

        let filtered = self.pipeline.apply(candidates, &context)?;
        let ranked = rank_candidates(filtered, top_n);

        debug!(
            "User {}: {} visited, {} recommendations",
            user_id,
            context.visited.len(),
            ranked.len()
        );
        Ok(Some(ranked))
    }
}

impl Default for Recommender {
    fn default() -> Self {
        Self::new()
    }
}

/// Sort by score, best first, and keep `top_n`
///
/// `sort_by` is stable, so equal scores keep their incoming order.
fn rank_candidates(mut candidates: Vec<Candidate>, top_n: usize) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    candidates.truncate(top_n);
    candidates
}

/// [`Recommender::recommend`] with the default filters
pub fn recommend(
    user_id: UserId,
    matrix: &UserItemMatrix,
    predicted: Option<&PredictedRatingMatrix>,
    top_n: usize,
) -> Result<Option<Vec<Candidate>>, RecommendError> {
    Recommender::new().recommend(user_id, matrix, predicted, top_n)
}

/// Attach attraction names (left join: unknown attractions keep `name: None`)
pub fn enrich(candidates: &[Candidate], dataset: &Dataset) -> Vec<AttractionRecommendation> {
    candidates
        .iter()
        .map(|candidate| AttractionRecommendation {
            attraction_id: candidate.attraction_id,
            score: candidate.score,
            name: dataset.item_name(candidate.attraction_id).map(str::to_string),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::{Item, Transaction};
    use model::{build_matrix, factorize, DuplicatePolicy};

    fn scenario_transactions() -> Vec<Transaction> {
        vec![
            Transaction::new(1, 10, 5.0),
            Transaction::new(1, 20, 3.0),
            Transaction::new(2, 10, 4.0),
        ]
    }

    /// 5 users x 4 attractions with a few gaps
    fn larger_matrix() -> UserItemMatrix {
        let transactions = vec![
            Transaction::new(1, 10, 5.0),
            Transaction::new(1, 20, 4.0),
            Transaction::new(2, 10, 4.0),
            Transaction::new(2, 30, 2.0),
            Transaction::new(3, 20, 5.0),
            Transaction::new(3, 40, 1.0),
            Transaction::new(4, 30, 4.0),
            Transaction::new(4, 40, 5.0),
            Transaction::new(5, 10, 3.0),
            Transaction::new(5, 20, 3.0),
            Transaction::new(5, 30, 3.0),
        ];
        build_matrix(&transactions, DuplicatePolicy::Mean).unwrap()
    }

    #[test]
    fn test_scenario_excludes_visited() {
        let matrix = build_matrix(&scenario_transactions(), DuplicatePolicy::Mean).unwrap();
        let predicted = factorize(&matrix, 1).unwrap();

        // User 1 rated both columns; attraction 30 has no column at all
        let recs = recommend(1, &matrix, Some(&predicted), 5).unwrap().unwrap();
        assert!(recs.is_empty());

        let recs = recommend(2, &matrix, Some(&predicted), 5).unwrap().unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].attraction_id, 20);
    }

    #[test]
    fn test_unknown_user_is_no_result() {
        let matrix = larger_matrix();
        let predicted = factorize(&matrix, 2).unwrap();

        let result = recommend(999, &matrix, Some(&predicted), 5).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_untrained_is_a_precondition_error() {
        let matrix = larger_matrix();
        let err = recommend(1, &matrix, None, 5).unwrap_err();
        assert!(matches!(err, RecommendError::ModelNotTrained));
    }

    #[test]
    fn test_stale_prediction_rejected() {
        let matrix = larger_matrix();
        let other = build_matrix(&scenario_transactions(), DuplicatePolicy::Mean).unwrap();
        let predicted = factorize(&other, 1).unwrap();

        let err = recommend(1, &matrix, Some(&predicted), 5).unwrap_err();
        assert!(matches!(
            err,
            RecommendError::StaleModel {
                rows: 5,
                cols: 4,
                pred_rows: 2,
                pred_cols: 2
            }
        ));
    }

    #[test]
    fn test_sorted_and_truncated() {
        let matrix = larger_matrix();
        let predicted = factorize(&matrix, 2).unwrap();

        for &user in matrix.user_ids() {
            let all = recommend(user, &matrix, Some(&predicted), 10).unwrap().unwrap();
            assert!(all.windows(2).all(|w| w[0].score >= w[1].score));
            for candidate in &all {
                assert!(matrix.get(user, candidate.attraction_id).unwrap() <= 0.0);
            }

            let one = recommend(user, &matrix, Some(&predicted), 1).unwrap().unwrap();
            assert!(one.len() <= 1);
            assert_eq!(one.first(), all.first());

            let none = recommend(user, &matrix, Some(&predicted), 0).unwrap().unwrap();
            assert!(none.is_empty());
        }
    }

    #[test]
    fn test_ties_keep_incoming_order() {
        let candidates = vec![
            Candidate::new(20, 1.0),
            Candidate::new(30, 2.0),
            Candidate::new(40, 1.0),
            Candidate::new(50, 2.0),
            Candidate::new(60, 1.0),
        ];

        let ranked = rank_candidates(candidates, 4);
        let ids: Vec<AttractionId> = ranked.iter().map(|c| c.attraction_id).collect();
        assert_eq!(ids, vec![30, 50, 20, 40]);
    }

    #[test]
    fn test_min_score_filter_applies() {
        let matrix = larger_matrix();
        let predicted = factorize(&matrix, 2).unwrap();

        let recommender = Recommender::new().with_min_score(f64::INFINITY);
        assert_eq!(
            recommender.filter_names(),
            vec!["AlreadyVisitedFilter", "MinimumScoreFilter"]
        );
        let recs = recommender
            .recommend(1, &matrix, Some(&predicted), 5)
            .unwrap()
            .unwrap();
        assert!(recs.is_empty());
    }

    #[test]
    fn test_enrich_left_joins_names() {
        let dataset = data_loader::Dataset::from_parts(
            Vec::new(),
            vec![Item::new(10, "A"), Item::new(20, "B")],
        )
        .unwrap();

        let enriched = enrich(&[Candidate::new(20, 1.5), Candidate::new(99, 0.5)], &dataset);

        assert_eq!(enriched.len(), 2);
        assert_eq!(enriched[0].name.as_deref(), Some("B"));
        assert_eq!(enriched[1].attraction_id, 99);
        assert_eq!(enriched[1].name, None);
    }
}
