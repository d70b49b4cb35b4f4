//! Types shared by the model and the recommendation pipeline.

use data_loader::{AttractionId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// An attraction the user might be recommended, with its predicted score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub attraction_id: AttractionId,
    pub score: f64,
}

impl Candidate {
    pub fn new(attraction_id: AttractionId, score: f64) -> Self {
        Self {
            attraction_id,
            score,
        }
    }
}

/// What the recommender needs to know about the requesting user
#[derive(Debug, Clone, PartialEq)]
pub struct UserContext {
    pub user_id: UserId,
    /// Attractions with a positive rating in the user-item matrix
    pub visited: HashSet<AttractionId>,
}

impl UserContext {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            visited: HashSet::new(),
        }
    }
}
