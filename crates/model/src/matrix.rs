//! Matrix Builder - pivot transactions into a dense user × attraction table.
//!
//! ## Layout
//! - Rows: every distinct UserId seen in the transactions, ascending
//! - Columns: every distinct AttractionId seen in the transactions, ascending
//! - Cells: the (aggregated) rating, or 0.0 when the user never rated it
//!
//! Columns come only from transactions. An attraction that exists in the
//! item table but was never visited has no column.
//!
//! A stored 0.0 means both "rated zero" and "never rated". Nothing here
//! tries to tell the two apart.

use crate::error::{ModelError, Result};
use data_loader::{AttractionId, Transaction, UserId};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::{DefaultHasher, Entry};
use std::collections::{BTreeSet, HashMap};
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::{debug, instrument};

/// What to do when the same (user, attraction) pair appears more than once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DuplicatePolicy {
    /// Average all ratings for the pair
    #[default]
    Mean,
    /// Keep the rating that comes last in input order
    Last,
    /// Fail with `ModelError::DuplicateEntry`
    Reject,
}

/// Row and column labels of a user × attraction matrix.
///
/// Shared (via `Arc`) between a rating matrix and every prediction derived
/// from it, so "same axes" is usually a pointer comparison.
#[derive(Debug, Clone)]
pub struct MatrixAxes {
    user_ids: Vec<UserId>,
    attraction_ids: Vec<AttractionId>,
    user_index: HashMap<UserId, usize>,
    attraction_index: HashMap<AttractionId, usize>,
}

impl MatrixAxes {
    /// Build axes from id lists; both must already be sorted and unique
    fn new(user_ids: Vec<UserId>, attraction_ids: Vec<AttractionId>) -> Self {
        let user_index = user_ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();
        let attraction_index = attraction_ids
            .iter()
            .enumerate()
            .map(|(i, &id)| (id, i))
            .collect();
        Self {
            user_ids,
            attraction_ids,
            user_index,
            attraction_index,
        }
    }

    pub fn user_ids(&self) -> &[UserId] {
        &self.user_ids
    }

    pub fn attraction_ids(&self) -> &[AttractionId] {
        &self.attraction_ids
    }

    /// Row position of a user
    pub fn user_index(&self, user_id: UserId) -> Option<usize> {
        self.user_index.get(&user_id).copied()
    }

    /// Column position of an attraction
    pub fn attraction_index(&self, attraction_id: AttractionId) -> Option<usize> {
        self.attraction_index.get(&attraction_id).copied()
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.user_ids.len(), self.attraction_ids.len())
    }
}

// The index maps are derived from the id lists, so comparing the lists is enough
impl PartialEq for MatrixAxes {
    fn eq(&self, other: &Self) -> bool {
        self.user_ids == other.user_ids && self.attraction_ids == other.attraction_ids
    }
}

/// Dense user × attraction rating matrix
#[derive(Debug, Clone)]
pub struct UserItemMatrix {
    axes: Arc<MatrixAxes>,
    values: DMatrix<f64>,
}

impl UserItemMatrix {
    pub fn axes(&self) -> &Arc<MatrixAxes> {
        &self.axes
    }

    /// The raw ratings, indexed by row/column position
    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    /// (rows, cols) = (users, attractions)
    pub fn shape(&self) -> (usize, usize) {
        self.axes.shape()
    }

    pub fn user_ids(&self) -> &[UserId] {
        self.axes.user_ids()
    }

    pub fn attraction_ids(&self) -> &[AttractionId] {
        self.axes.attraction_ids()
    }

    pub fn contains_user(&self, user_id: UserId) -> bool {
        self.axes.user_index(user_id).is_some()
    }

    /// Rating stored for a (user, attraction) pair; `None` if either id is not an axis label
    pub fn get(&self, user_id: UserId, attraction_id: AttractionId) -> Option<f64> {
        let row = self.axes.user_index(user_id)?;
        let col = self.axes.attraction_index(attraction_id)?;
        Some(self.values[(row, col)])
    }

    /// Full row of a user as (attraction, rating) pairs in column order
    pub fn user_row(&self, user_id: UserId) -> Option<Vec<(AttractionId, f64)>> {
        let row = self.axes.user_index(user_id)?;
        Some(
            self.axes
                .attraction_ids()
                .iter()
                .enumerate()
                .map(|(col, &attraction_id)| (attraction_id, self.values[(row, col)]))
                .collect(),
        )
    }

    /// Smallest and largest UserId, or `None` for an empty matrix
    pub fn user_id_range(&self) -> Option<(UserId, UserId)> {
        let ids = self.axes.user_ids();
        Some((*ids.first()?, *ids.last()?))
    }

    /// Fraction of cells holding a non-zero rating
    pub fn density(&self) -> f64 {
        let total = self.values.len();
        if total == 0 {
            return 0.0;
        }
        let filled = self.values.iter().filter(|&&v| v != 0.0).count();
        filled as f64 / total as f64
    }

    /// Content hash of the axes and every cell
    ///
    /// Two matrices with equal fingerprints were built from equivalent
    /// input; used as the cache key for trained models.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.axes.user_ids().hash(&mut hasher);
        self.axes.attraction_ids().hash(&mut hasher);
        for value in self.values.iter() {
            value.to_bits().hash(&mut hasher);
        }
        hasher.finish()
    }
}

/// Build the dense user × attraction matrix from transactions.
///
/// Pure function of its input. Every cell of the result holds a number;
/// pairs without a transaction are 0.0. An empty input gives a 0 × 0 matrix.
///
/// # Errors
/// - `InvalidRating` if a rating is NaN or infinite
/// - `DuplicateEntry` for a repeated pair under `DuplicatePolicy::Reject`
#[instrument(skip(transactions), fields(transactions = transactions.len()))]
pub fn build_matrix(transactions: &[Transaction], policy: DuplicatePolicy) -> Result<UserItemMatrix> {
    let mut users = BTreeSet::new();
    let mut attractions = BTreeSet::new();
    for t in transactions {
        if !t.rating.is_finite() {
            return Err(ModelError::InvalidRating {
                user_id: t.user_id,
                attraction_id: t.attraction_id,
                value: t.rating,
            });
        }
        users.insert(t.user_id);
        attractions.insert(t.attraction_id);
    }

    let axes = MatrixAxes::new(users.into_iter().collect(), attractions.into_iter().collect());

    // (sum, count) per occupied cell
    let mut cells: HashMap<(usize, usize), (f64, u32)> = HashMap::new();
    let mut duplicates = 0usize;
    for t in transactions {
        // Both lookups succeed: the axes were built from these same records
        let (Some(row), Some(col)) = (
            axes.user_index(t.user_id),
            axes.attraction_index(t.attraction_id),
        ) else {
            continue;
        };

        match cells.entry((row, col)) {
            Entry::Vacant(slot) => {
                slot.insert((t.rating, 1));
            }
            Entry::Occupied(mut slot) => {
                duplicates += 1;
                let cell = slot.get_mut();
                match policy {
                    DuplicatePolicy::Mean => {
                        cell.0 += t.rating;
                        cell.1 += 1;
                    }
                    DuplicatePolicy::Last => *cell = (t.rating, 1),
                    DuplicatePolicy::Reject => {
                        return Err(ModelError::DuplicateEntry {
                            user_id: t.user_id,
                            attraction_id: t.attraction_id,
                        });
                    }
                }
            }
        }
    }

    let (rows, cols) = axes.shape();
    let mut values = DMatrix::zeros(rows, cols);
    for ((row, col), (sum, count)) in cells {
        values[(row, col)] = sum / count as f64;
    }

    debug!(
        "Built {}x{} user-item matrix ({} duplicate pairs, policy {:?})",
        rows, cols, duplicates, policy
    );

    Ok(UserItemMatrix {
        axes: Arc::new(axes),
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> Vec<Transaction> {
        vec![
            Transaction::new(1, 10, 5.0),
            Transaction::new(1, 20, 3.0),
            Transaction::new(2, 10, 4.0),
        ]
    }

    #[test]
    fn test_build_matrix_scenario() {
        let matrix = build_matrix(&scenario(), DuplicatePolicy::Mean).unwrap();

        assert_eq!(matrix.shape(), (2, 2));
        assert_eq!(matrix.user_ids(), &[1, 2]);
        // Column 30 only exists in the item table, never in a transaction
        assert_eq!(matrix.attraction_ids(), &[10, 20]);
        assert_eq!(matrix.get(1, 10), Some(5.0));
        assert_eq!(matrix.get(1, 20), Some(3.0));
        assert_eq!(matrix.get(2, 10), Some(4.0));
        assert_eq!(matrix.get(2, 20), Some(0.0));
        assert_eq!(matrix.get(1, 30), None);
    }

    #[test]
    fn test_every_cell_is_defined() {
        let transactions = vec![
            Transaction::new(7, 3, 2.0),
            Transaction::new(1, 9, 4.0),
            Transaction::new(4, 5, 1.0),
            Transaction::new(1, 3, 5.0),
        ];
        let matrix = build_matrix(&transactions, DuplicatePolicy::Mean).unwrap();

        let (rows, cols) = matrix.shape();
        assert_eq!((rows, cols), (3, 3));
        assert_eq!(matrix.values().len(), rows * cols);
        assert!(matrix.values().iter().all(|v| v.is_finite()));
        for &user in matrix.user_ids() {
            for &attraction in matrix.attraction_ids() {
                assert!(matrix.get(user, attraction).is_some());
            }
        }
    }

    #[test]
    fn test_axes_are_sorted() {
        let transactions = vec![
            Transaction::new(30, 300, 1.0),
            Transaction::new(10, 100, 1.0),
            Transaction::new(20, 200, 1.0),
        ];
        let matrix = build_matrix(&transactions, DuplicatePolicy::Mean).unwrap();

        assert_eq!(matrix.user_ids(), &[10, 20, 30]);
        assert_eq!(matrix.attraction_ids(), &[100, 200, 300]);
        assert_eq!(matrix.user_id_range(), Some((10, 30)));
    }

    #[test]
    fn test_duplicate_policies() {
        let transactions = vec![
            Transaction::new(1, 10, 2.0),
            Transaction::new(1, 10, 4.0),
            Transaction::new(1, 10, 5.0),
        ];

        let mean = build_matrix(&transactions, DuplicatePolicy::Mean).unwrap();
        assert!((mean.get(1, 10).unwrap() - 11.0 / 3.0).abs() < 1e-12);

        let last = build_matrix(&transactions, DuplicatePolicy::Last).unwrap();
        assert_eq!(last.get(1, 10), Some(5.0));

        let err = build_matrix(&transactions, DuplicatePolicy::Reject).unwrap_err();
        assert_eq!(
            err,
            ModelError::DuplicateEntry {
                user_id: 1,
                attraction_id: 10
            }
        );
    }

    #[test]
    fn test_non_finite_rating_rejected() {
        let transactions = vec![Transaction::new(1, 10, f64::NAN)];
        let err = build_matrix(&transactions, DuplicatePolicy::Mean).unwrap_err();
        assert!(matches!(err, ModelError::InvalidRating { user_id: 1, .. }));
    }

    #[test]
    fn test_empty_input() {
        let matrix = build_matrix(&[], DuplicatePolicy::Mean).unwrap();
        assert_eq!(matrix.shape(), (0, 0));
        assert_eq!(matrix.user_id_range(), None);
        assert_eq!(matrix.density(), 0.0);
    }

    #[test]
    fn test_user_row_and_density() {
        let matrix = build_matrix(&scenario(), DuplicatePolicy::Mean).unwrap();

        assert_eq!(matrix.user_row(2), Some(vec![(10, 4.0), (20, 0.0)]));
        assert_eq!(matrix.user_row(3), None);
        assert!((matrix.density() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let a = build_matrix(&scenario(), DuplicatePolicy::Mean).unwrap();
        let b = build_matrix(&scenario(), DuplicatePolicy::Mean).unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());

        let mut changed = scenario();
        changed[2].rating = 3.5;
        let c = build_matrix(&changed, DuplicatePolicy::Mean).unwrap();
        assert_ne!(a.fingerprint(), c.fingerprint());
    }
}
