//! # Data Loader Crate
//!
//! This crate handles loading the tourism dataset: the transaction table
//! (who visited which attraction and how they rated it) and the item table
//! (attraction names).
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Transaction, Item, Dataset)
//! - **parser**: Parse the CSV exports into Rust structs
//! - **index**: Build the Dataset, statistics and validation
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::Dataset;
//! use std::path::Path;
//!
//! // Load Transaction.csv and Item.csv from a directory
//! let dataset = Dataset::load_from_files(Path::new("data"))?;
//!
//! let visits = dataset.get_user_transactions(70456);
//! println!("User 70456 visited {} attractions", visits.len());
//! ```

// Public modules
pub mod error;
pub mod index;
pub mod parser;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use index::{ITEMS_FILE, TRANSACTIONS_FILE};
pub use types::{
    // Type aliases
    AttractionId,
    UserId,
    // Core types
    AttractionStats,
    Dataset,
    Item,
    Transaction,
    MAX_RATING,
    MIN_RATING,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_creation() {
        let dataset = Dataset::new();
        assert_eq!(dataset.counts(), (0, 0, 0));
    }

    #[test]
    fn test_insert_item() {
        let mut dataset = Dataset::new();
        dataset.insert_item(Item::new(369, "Kuta Beach - Bali"));

        let retrieved = dataset.get_item(369).unwrap();
        assert_eq!(retrieved.name, "Kuta Beach - Bali");
        assert_eq!(dataset.item_name(369), Some("Kuta Beach - Bali"));
    }

    #[test]
    fn test_insert_transaction_keeps_order() {
        let mut dataset = Dataset::new();
        dataset.insert_transaction(Transaction::new(1, 20, 3.0));
        dataset.insert_transaction(Transaction::new(1, 10, 5.0));

        let visits = dataset.get_user_transactions(1);
        assert_eq!(visits.len(), 2);
        assert_eq!(visits[0].attraction_id, 20);
        assert_eq!(dataset.transactions()[1].attraction_id, 10);
    }

    #[test]
    fn test_empty_queries() {
        let dataset = Dataset::new();

        assert!(dataset.get_item(999).is_none());
        assert!(dataset.get_user_transactions(999).is_empty());
        assert!(dataset.get_attraction_stats(999).is_none());
    }
}
