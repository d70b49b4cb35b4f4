//! Dataset building and indexing logic.
//!
//! This module builds the [`Dataset`] from parsed tables:
//! - Insert items and transactions (primary tables + per-user index)
//! - Compute aggregate statistics per attraction
//! - Validate the tables
//!
//! Rust concepts you'll learn:
//! - Using Rayon for parallel processing
//! - Iterator methods (map, filter, fold, etc.)
//! - Entry API for HashMap

use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::types::*;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// File name of the transaction table inside the data directory
pub const TRANSACTIONS_FILE: &str = "Transaction.csv";

/// File name of the item table inside the data directory
pub const ITEMS_FILE: &str = "Item.csv";

impl Dataset {
    /// Load the tourism dataset from a directory
    ///
    /// This is the main entry point for loading data.
    ///
    /// Steps:
    /// 1. Parse both files (in parallel)
    /// 2. Build the tables and indices
    /// 3. Compute attraction statistics
    /// 4. Validate data integrity
    pub fn load_from_files(data_dir: &Path) -> Result<Self> {
        info!("Loading tourism dataset from {:?}", data_dir);

        let transactions_path = data_dir.join(TRANSACTIONS_FILE);
        let items_path = data_dir.join(ITEMS_FILE);

        // Rayon's `join` runs the two closures in parallel
        let (transactions, items) = rayon::join(
            || parser::parse_transactions(&transactions_path),
            || parser::parse_items(&items_path),
        );
        let transactions = transactions?;
        let items = items?;

        info!(
            "Parsed {} transactions and {} items",
            transactions.len(),
            items.len()
        );

        let dataset = Self::from_parts(transactions, items)?;
        info!("Dataset successfully built and validated");
        Ok(dataset)
    }

    /// Build a dataset from already-parsed tables
    ///
    /// Fails on a repeated AttractionId in the item table or on a rating
    /// outside `MIN_RATING..=MAX_RATING`.
    pub fn from_parts(transactions: Vec<Transaction>, items: Vec<Item>) -> Result<Self> {
        let mut dataset = Dataset::new();

        for item in items {
            if dataset.items.contains_key(&item.attraction_id) {
                return Err(DataLoadError::DuplicateItem {
                    id: item.attraction_id,
                });
            }
            dataset.insert_item(item);
        }

        for transaction in transactions {
            dataset.insert_transaction(transaction);
        }

        dataset.validate()?;
        dataset.compute_attraction_stats();

        let unknown = dataset.unknown_attractions();
        if !unknown.is_empty() {
            // Names are left-joined later, so this is not fatal
            warn!(
                "{} attractions referenced by transactions have no item row",
                unknown.len()
            );
        }

        Ok(dataset)
    }

    /// Compute aggregate statistics for all attractions
    ///
    /// For each attraction: average rating, visit count and a popularity
    /// score (`avg_rating * ln(visit_count + 1)`).
    pub fn compute_attraction_stats(&mut self) {
        let mut grouped: HashMap<AttractionId, Vec<f64>> = HashMap::new();
        for transaction in &self.transactions {
            grouped
                .entry(transaction.attraction_id)
                .or_default()
                .push(transaction.rating);
        }

        self.attraction_stats = grouped
            .par_iter()
            .map(|(&attraction_id, ratings)| {
                let visit_count = ratings.len() as u32;
                let avg_rating = if visit_count > 0 {
                    ratings.iter().sum::<f64>() / visit_count as f64
                } else {
                    0.0
                };

                (
                    attraction_id,
                    AttractionStats {
                        avg_rating,
                        visit_count,
                        popularity_score: compute_popularity_score(avg_rating, visit_count),
                    },
                )
            })
            .collect();
    }

    /// Validate data integrity
    ///
    /// Every rating must be finite and inside `MIN_RATING..=MAX_RATING`.
    pub fn validate(&self) -> Result<()> {
        for transaction in &self.transactions {
            let rating = transaction.rating;
            if !rating.is_finite() || !(MIN_RATING..=MAX_RATING).contains(&rating) {
                return Err(DataLoadError::InvalidValue {
                    field: "Rating".to_string(),
                    value: rating.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Attractions that appear in transactions but not in the item table, sorted
    pub fn unknown_attractions(&self) -> Vec<AttractionId> {
        let mut unknown: Vec<AttractionId> = self
            .attraction_stats
            .keys()
            .filter(|id| !self.items.contains_key(id))
            .copied()
            .collect();
        unknown.sort_unstable();
        unknown
    }
}

/// Helper function to compute popularity score
///
/// Rewards both high ratings and many visits
fn compute_popularity_score(avg_rating: f64, visit_count: u32) -> f64 {
    avg_rating * (visit_count as f64 + 1.0).ln()
}
