//! Factorization Engine - truncated SVD of the user × attraction matrix.
//!
//! ## Algorithm
//! The rating matrix `X` (users × attractions) is approximated by its top
//! `k` singular triplets:
//!
//! ```text
//! X ≈ U_k · Σ_k · V_kᵗ
//! ```
//!
//! - user factors  = `U_k · Σ_k`  (users × k)
//! - item factors  = `V_k`        (attractions × k)
//! - predictions   = user factors · item factorsᵗ
//!
//! The reconstruction densifies the zeros of `X`: attractions a user never
//! visited get a predicted score, which is what the recommender ranks.
//!
//! Two solvers are available:
//! - `Solver::Exact` runs a full SVD and keeps the top `k` components.
//! - `Solver::Randomized` (default) projects `X` onto a seeded random
//!   subspace, sharpens it with power iterations and runs the exact SVD on
//!   the small projected matrix (Halko, Martinsson & Tropp).
//!
//! Both are deterministic: the randomized solver draws from an RNG seeded
//! with `SvdConfig::seed`, and component signs are normalised so the
//! largest-magnitude entry of every item component is positive.

use crate::error::{ModelError, Result};
use crate::matrix::{MatrixAxes, UserItemMatrix};
use data_loader::{AttractionId, UserId};
use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Number of latent components used when the caller doesn't choose one
pub const DEFAULT_RANK: usize = 10;

/// Seed for the randomized solver
pub const DEFAULT_SEED: u64 = 42;

/// Power iterations of the randomized range finder
pub const DEFAULT_POWER_ITERATIONS: usize = 5;

/// Extra random probes beyond `rank` in the randomized range finder
pub const DEFAULT_OVERSAMPLES: usize = 10;

/// Iteration cap handed to the dense SVD routine
const MAX_SVD_ITERATIONS: usize = 10_000;

/// Which SVD routine computes the decomposition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Solver {
    /// Seeded randomized range finder followed by a small exact SVD
    #[default]
    Randomized,
    /// Full dense SVD, truncated afterwards
    Exact,
}

/// Settings for one factorization run
///
/// Builder style, like the candidate sources:
///
/// ```ignore
/// let config = SvdConfig::new(10).with_solver(Solver::Exact).with_seed(7);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SvdConfig {
    pub rank: usize,
    pub solver: Solver,
    pub seed: u64,
    pub n_iter: usize,
    pub n_oversamples: usize,
}

impl SvdConfig {
    /// Default settings with a specific rank
    pub fn new(rank: usize) -> Self {
        Self {
            rank,
            ..Self::default()
        }
    }

    /// Configure the number of latent components (default: 10)
    pub fn with_rank(mut self, rank: usize) -> Self {
        self.rank = rank;
        self
    }

    /// Configure the solver (default: randomized)
    pub fn with_solver(mut self, solver: Solver) -> Self {
        self.solver = solver;
        self
    }

    /// Configure the RNG seed of the randomized solver (default: 42)
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Configure the number of power iterations (default: 5)
    pub fn with_power_iterations(mut self, n_iter: usize) -> Self {
        self.n_iter = n_iter;
        self
    }

    /// Configure the number of oversampling probes (default: 10)
    pub fn with_oversamples(mut self, n_oversamples: usize) -> Self {
        self.n_oversamples = n_oversamples;
        self
    }
}

impl Default for SvdConfig {
    fn default() -> Self {
        Self {
            rank: DEFAULT_RANK,
            solver: Solver::default(),
            seed: DEFAULT_SEED,
            n_iter: DEFAULT_POWER_ITERATIONS,
            n_oversamples: DEFAULT_OVERSAMPLES,
        }
    }
}

/// Low-rank factors of a rating matrix
#[derive(Debug, Clone)]
pub struct LatentFactors {
    axes: Arc<MatrixAxes>,
    /// users × k, already scaled by the singular values
    user_factors: DMatrix<f64>,
    /// attractions × k
    item_factors: DMatrix<f64>,
    singular_values: Vec<f64>,
    explained_variance_ratio: Vec<f64>,
}

impl LatentFactors {
    /// Number of latent components
    pub fn rank(&self) -> usize {
        self.singular_values.len()
    }

    pub fn axes(&self) -> &Arc<MatrixAxes> {
        &self.axes
    }

    pub fn user_factors(&self) -> &DMatrix<f64> {
        &self.user_factors
    }

    pub fn item_factors(&self) -> &DMatrix<f64> {
        &self.item_factors
    }

    /// Singular values, largest first
    pub fn singular_values(&self) -> &[f64] {
        &self.singular_values
    }

    /// Share of the matrix's column variance captured by each component
    pub fn explained_variance_ratio(&self) -> &[f64] {
        &self.explained_variance_ratio
    }

    /// Predicted scores for one user, in column order, without building the full matrix
    pub fn predict_row(&self, user_id: UserId) -> Option<Vec<f64>> {
        let row = self.axes.user_index(user_id)?;
        let scores = self.user_factors.row(row) * self.item_factors.transpose();
        Some(scores.iter().copied().collect())
    }

    /// Dense reconstruction of every user's predicted scores
    pub fn reconstruct(&self) -> PredictedRatingMatrix {
        PredictedRatingMatrix {
            axes: Arc::clone(&self.axes),
            values: &self.user_factors * self.item_factors.transpose(),
        }
    }
}

/// Reconstructed scores, same axes as the rating matrix they came from
#[derive(Debug, Clone)]
pub struct PredictedRatingMatrix {
    axes: Arc<MatrixAxes>,
    values: DMatrix<f64>,
}

impl PredictedRatingMatrix {
    pub fn axes(&self) -> &Arc<MatrixAxes> {
        &self.axes
    }

    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    pub fn shape(&self) -> (usize, usize) {
        self.axes.shape()
    }

    /// True when this prediction lines up row-for-row and column-for-column with `matrix`
    pub fn matches(&self, matrix: &UserItemMatrix) -> bool {
        Arc::ptr_eq(&self.axes, matrix.axes()) || *self.axes == **matrix.axes()
    }

    pub fn get(&self, user_id: UserId, attraction_id: AttractionId) -> Option<f64> {
        let row = self.axes.user_index(user_id)?;
        let col = self.axes.attraction_index(attraction_id)?;
        Some(self.values[(row, col)])
    }

    /// One user's predicted scores as (attraction, score) pairs in column order
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
}

/// Check `1 <= rank < min(rows, cols)`
pub fn validate_rank(rank: usize, rows: usize, cols: usize) -> Result<()> {
    if rank == 0 || rank >= rows.min(cols) {
        return Err(ModelError::InvalidRank { rank, rows, cols });
    }
    Ok(())
}

/// Factor `matrix` into `rank` components and return the dense predictions.
///
/// Uses the default configuration (randomized solver, seed 42).
pub fn factorize(matrix: &UserItemMatrix, rank: usize) -> Result<PredictedRatingMatrix> {
    Ok(fit(matrix, &SvdConfig::new(rank))?.reconstruct())
}

/// Compute the truncated SVD factors of `matrix`.
///
/// # Errors
/// - `InvalidRank` unless `1 <= config.rank < min(rows, cols)`
/// - `Decomposition` if the dense SVD routine fails to converge
#[instrument(skip(matrix), fields(shape = ?matrix.shape()))]
pub fn fit(matrix: &UserItemMatrix, config: &SvdConfig) -> Result<LatentFactors> {
    let (rows, cols) = matrix.shape();
    validate_rank(config.rank, rows, cols)?;

    let x = matrix.values();
    let (mut u, singular_values, mut v_t) = match config.solver {
        Solver::Exact => truncated_svd(x, config.rank)?,
        Solver::Randomized => randomized_svd(x, config)?,
    };
    flip_signs(&mut u, &mut v_t);

    let k = config.rank;
    let user_factors = DMatrix::from_fn(rows, k, |i, j| u[(i, j)] * singular_values[j]);
    let item_factors = v_t.transpose();
    let explained_variance_ratio = explained_variance_ratio(x, &user_factors);

    debug!(
        "Factorized {}x{} matrix into {} components (top singular value {:.4})",
        rows,
        cols,
        k,
        singular_values.first().copied().unwrap_or(0.0)
    );

    Ok(LatentFactors {
        axes: Arc::clone(matrix.axes()),
        user_factors,
        item_factors,
        singular_values,
        explained_variance_ratio,
    })
}

/// Top-`k` singular triplets via a full dense SVD: (U_k, σ_k, V_kᵗ)
fn truncated_svd(a: &DMatrix<f64>, k: usize) -> Result<(DMatrix<f64>, Vec<f64>, DMatrix<f64>)> {
    let svd = a
        .clone()
        .try_svd(true, true, f64::EPSILON, MAX_SVD_ITERATIONS)
        .ok_or_else(|| ModelError::Decomposition("SVD did not converge".to_string()))?;
    let u = svd
        .u
        .ok_or_else(|| ModelError::Decomposition("left singular vectors missing".to_string()))?;
    let v_t = svd
        .v_t
        .ok_or_else(|| ModelError::Decomposition("right singular vectors missing".to_string()))?;
    let sigma = svd.singular_values;

    // Largest first; the stable sort keeps equal values in routine order
    let mut order: Vec<usize> = (0..sigma.len()).collect();
    order.sort_by(|&a, &b| sigma[b].total_cmp(&sigma[a]));
    if order.len() < k {
        return Err(ModelError::Decomposition(format!(
            "only {} singular values for {} components",
            order.len(),
            k
        )));
    }
    let order = &order[..k];

    let u_k = DMatrix::from_fn(u.nrows(), k, |i, j| u[(i, order[j])]);
    let v_t_k = DMatrix::from_fn(k, v_t.ncols(), |i, j| v_t[(order[i], j)]);
    let sigma_k = order.iter().map(|&i| sigma[i]).collect();

    Ok((u_k, sigma_k, v_t_k))
}

/// Randomized truncated SVD
///
/// 1. Draw a seeded `cols × p` test matrix Ω (p = rank + oversamples, capped at min(rows, cols))
/// 2. Q = orth(X·Ω), refined by `n_iter` rounds of Q = orth(X·orth(Xᵗ·Q))
/// 3. B = Qᵗ·X (p × cols), exact SVD of B, U = Q·U_B
fn randomized_svd(
    x: &DMatrix<f64>,
    config: &SvdConfig,
) -> Result<(DMatrix<f64>, Vec<f64>, DMatrix<f64>)> {
    let (rows, cols) = x.shape();
    let probes = (config.rank + config.n_oversamples).min(rows.min(cols));

    let mut rng = StdRng::seed_from_u64(config.seed);
    let omega = DMatrix::from_fn(cols, probes, |_, _| rng.random_range(-1.0..1.0));

    let mut q = orthonormal_basis(x * &omega);
    for _ in 0..config.n_iter {
        q = orthonormal_basis(x.transpose() * &q);
        q = orthonormal_basis(x * &q);
    }

    let b = q.transpose() * x;
    let (u_b, sigma, v_t) = truncated_svd(&b, config.rank)?;
    Ok((&q * u_b, sigma, v_t))
}

/// Orthonormal basis of the column space (thin Q of a QR decomposition)
fn orthonormal_basis(m: DMatrix<f64>) -> DMatrix<f64> {
    m.qr().q()
}

/// Make the largest-magnitude entry of every row of `v_t` positive,
/// flipping the matching column of `u` along with it.
fn flip_signs(u: &mut DMatrix<f64>, v_t: &mut DMatrix<f64>) {
    for c in 0..v_t.nrows() {
        let mut pivot = 0;
        let mut pivot_abs = f64::NEG_INFINITY;
        for j in 0..v_t.ncols() {
            let magnitude = v_t[(c, j)].abs();
            if magnitude > pivot_abs {
                pivot_abs = magnitude;
                pivot = j;
            }
        }

        if v_t.ncols() > 0 && v_t[(c, pivot)] < 0.0 {
            for j in 0..v_t.ncols() {
                v_t[(c, j)] = -v_t[(c, j)];
            }
            for i in 0..u.nrows() {
                u[(i, c)] = -u[(i, c)];
            }
        }
    }
}

/// Population variance of each column
fn column_variances(m: &DMatrix<f64>) -> Vec<f64> {
    let n = m.nrows() as f64;
    m.column_iter()
        .map(|column| {
            let mean = column.iter().sum::<f64>() / n;
            column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
        })
        .collect()
}

fn explained_variance_ratio(x: &DMatrix<f64>, user_factors: &DMatrix<f64>) -> Vec<f64> {
    let total: f64 = column_variances(x).iter().sum();
    column_variances(user_factors)
        .into_iter()
        .map(|variance| if total > 0.0 { variance / total } else { 0.0 })
        .collect()
}
