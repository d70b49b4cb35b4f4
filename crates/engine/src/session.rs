//! # Recommendation Session
//!
//! Owns everything one interactive user of the tool works with:
//! 1. The loaded dataset (shared, read-only)
//! 2. The user-item matrix, built once when the session starts
//! 3. The trained model, present only after an explicit `train`
//!
//! ## Concurrency
//! Training runs outside the model lock and is serialized by its own mutex,
//! so two concurrent `train` calls don't both do the work. Readers take the
//! model lock only long enough to clone the `Arc`, and see either the old or
//! the new model, never a half-built one. A failed training leaves the
//! previous model in place.

use std::sync::{Arc, Mutex, RwLock};
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use tracing::{info, warn};

use data_loader::{Dataset, UserId};
use model::{build_matrix, train, DuplicatePolicy, SvdConfig, TrainedModel, UserItemMatrix};
use pipeline::{enrich, AttractionRecommendation, Recommender};

/// Session state for the train/recommend workflow
pub struct RecommendationSession {
    dataset: Arc<Dataset>,
    matrix: Arc<UserItemMatrix>,
    model: RwLock<Option<Arc<TrainedModel>>>,
    training: Mutex<()>,
    recommender: Recommender,
}

impl RecommendationSession {
    /// Build the rating matrix for `dataset` and start untrained
    pub fn new(dataset: Arc<Dataset>, policy: DuplicatePolicy) -> Result<Self> {
        let start = Instant::now();
        let matrix = build_matrix(dataset.transactions(), policy)
            .context("Failed to build user-item matrix")?;

        let (rows, cols) = matrix.shape();
        info!(
            "User-item matrix shape: {}x{} (density {:.4}) built in {:.2?}",
            rows,
            cols,
            matrix.density(),
            start.elapsed()
        );

        Ok(Self {
            dataset,
            matrix: Arc::new(matrix),
            model: RwLock::new(None),
            training: Mutex::new(()),
            recommender: Recommender::new(),
        })
    }

    /// Replace the default recommender (e.g. to add a minimum score)
    pub fn with_recommender(mut self, recommender: Recommender) -> Self {
        self.recommender = recommender;
        self
    }

    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    pub fn matrix(&self) -> &Arc<UserItemMatrix> {
        &self.matrix
    }

    /// The current model handle, if training has happened
    pub fn trained_model(&self) -> Result<Option<Arc<TrainedModel>>> {
        let guard = self
            .model
            .read()
            .map_err(|_| anyhow!("Model lock poisoned"))?;
        Ok(guard.clone())
    }

    pub fn is_trained(&self) -> Result<bool> {
        Ok(self.trained_model()?.is_some())
    }

    /// Train (or reuse) a model for this session's matrix.
    ///
    /// Returns the cached model when it was already trained with an equal
    /// config on this matrix.
    pub fn train(&self, config: &SvdConfig) -> Result<Arc<TrainedModel>> {
        let _training = self
            .training
            .lock()
            .map_err(|_| anyhow!("Training lock poisoned"))?;

        if let Some(current) = self.trained_model()? {
            if current.is_trained_on(&self.matrix, config) {
                info!("Reusing trained model (rank {})", config.rank);
                return Ok(current);
            }
        }

        let model = match train(&self.matrix, config) {
            Ok(model) => Arc::new(model),
            Err(err) => {
                warn!("Training failed, keeping previous model: {}", err);
                return Err(err).context("Failed to train recommendation model");
            }
        };

        let mut slot = self
            .model
            .write()
            .map_err(|_| anyhow!("Model lock poisoned"))?;
        *slot = Some(Arc::clone(&model));
        Ok(model)
    }

    /// Top-`limit` recommendations for `user_id`, names attached.
    ///
    /// `Ok(None)` means the user is not in the rating matrix. Calling this
    /// before `train` fails with `pipeline::RecommendError::ModelNotTrained`
    /// (reachable through `anyhow::Error::downcast_ref`).
    pub fn recommend(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Option<Vec<AttractionRecommendation>>> {
        let start = Instant::now();
        let model = self.trained_model()?;

        let ranked = self.recommender.recommend(
            user_id,
            &self.matrix,
            model.as_deref().map(TrainedModel::predicted),
            limit,
        )?;

        let recommendations = ranked.map(|candidates| enrich(&candidates, &self.dataset));
        info!(
            "Recommendations for user {}: {} in {:.2?}",
            user_id,
            recommendations
                .as_ref()
                .map(|r| r.len().to_string())
                .unwrap_or_else(|| "unknown user".to_string()),
            start.elapsed()
        );
        Ok(recommendations)
    }
}
