//! Recommendation pipeline: turn predicted ratings into a ranked list.
//!
//! This crate provides:
//! - Filter trait and implementations for candidate filtering
//! - FilterPipeline for composing filters
//! - Recommender, which ranks a user's unvisited attractions
//! - enrich, which attaches attraction names
//!
//! ## Architecture
//! 1. The predicted row of the user becomes a list of candidates
//! 2. Filters remove unwanted candidates (already visited, weak scores)
//! 3. Remaining candidates are sorted by score and cut to top-N
//! 4. Names are joined in from the item table
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{enrich, Recommender};
//!
//! let recommender = Recommender::new();
//! match recommender.recommend(user_id, &matrix, Some(model.predicted()), 5)? {
//!     None => println!("unknown user"),
//!     Some(top) => {
//!         for rec in enrich(&top, &dataset) {
//!             println!("{} {:.3}", rec.attraction_id, rec.score);
//!         }
//!     }
//! }
//! ```

pub mod error;
pub mod filter_pipeline;
pub mod filters;
pub mod recommend;
pub mod traits;

// Re-export main types
pub use error::RecommendError;
pub use filter_pipeline::FilterPipeline;
pub use recommend::{enrich, recommend, AttractionRecommendation, Recommender, DEFAULT_TOP_N};
pub use traits::Filter;
