//! Engine crate for the attraction recommender.
//!
//! This crate contains the session that ties the pieces together for an
//! interactive caller: dataset, rating matrix and the trained model.

pub mod session;

pub use session::RecommendationSession;
