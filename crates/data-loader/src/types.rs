//! Core domain types for the tourism dataset.
//!
//! This module defines the fundamental data structures used throughout the system.
//! Key Rust concepts demonstrated here:
//! - Type aliases for domain clarity (UserId, AttractionId)
//! - Structs with public fields
//! - Derive macros for common traits
//! - HashMap for efficient lookups

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Type Aliases
// =============================================================================
// These make the domain clearer and prevent mixing up user IDs with attraction IDs

/// Unique identifier for a user
pub type UserId = u32;

/// Unique identifier for an attraction
pub type AttractionId = u32;

/// Lowest rating accepted by [`Dataset::validate`]
pub const MIN_RATING: f64 = 0.0;

/// Highest rating accepted by [`Dataset::validate`]
pub const MAX_RATING: f64 = 5.0;

// =============================================================================
// Table rows
// =============================================================================

/// A single visit of a user to an attraction, with the rating they gave
///
/// Rust concepts:
/// - Small, copyable struct (all fields are Copy)
/// - Immutable once loaded: nothing in the workspace hands out `&mut Transaction`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub user_id: UserId,
    pub attraction_id: AttractionId,
    pub rating: f64,
}

impl Transaction {
    pub fn new(user_id: UserId, attraction_id: AttractionId, rating: f64) -> Self {
        Self {
            user_id,
            attraction_id,
            rating,
        }
    }
}

/// One row of the item table: an attraction and its display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub attraction_id: AttractionId,
    pub name: String,
}

impl Item {
    pub fn new(attraction_id: AttractionId, name: impl Into<String>) -> Self {
        Self {
            attraction_id,
            name: name.into(),
        }
    }
}

// =============================================================================
// Statistics Types
// =============================================================================

/// Precomputed statistics for an attraction
///
/// These are computed once when loading data for fast lookups later
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AttractionStats {
    pub avg_rating: f64,
    pub visit_count: u32,
    /// Popularity score derived from visit count and average rating
    pub popularity_score: f64,
}

// =============================================================================
// Dataset - The In-Memory Tables
// =============================================================================

/// Holds the transaction and item tables plus a few lookup indices.
///
/// Transactions are kept in their original file order as well, because the
/// matrix builder's `Last` duplicate policy depends on that order.
#[derive(Debug)]
pub struct Dataset {
    pub(crate) transactions: Vec<Transaction>,
    pub(crate) items: HashMap<AttractionId, Item>,

    /// All transactions made by each user, in file order
    pub(crate) user_transactions: HashMap<UserId, Vec<Transaction>>,

    pub(crate) attraction_stats: HashMap<AttractionId, AttractionStats>,
}

impl Dataset {
    /// Creates a new, empty Dataset
    pub fn new() -> Self {
        Self {
            transactions: Vec::new(),
            items: HashMap::new(),
            user_transactions: HashMap::new(),
            attraction_stats: HashMap::new(),
        }
    }

    /// All transactions in load order
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Get an item by attraction ID
    pub fn get_item(&self, id: AttractionId) -> Option<&Item> {
        self.items.get(&id)
    }

    /// Display name of an attraction, if the item table knows it
    pub fn item_name(&self, id: AttractionId) -> Option<&str> {
        self.items.get(&id).map(|item| item.name.as_str())
    }

    /// Iterate over all items (unordered)
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    /// Get all transactions made by a user
    ///
    /// Returns an empty slice if the user has no transactions
    pub fn get_user_transactions(&self, user_id: UserId) -> &[Transaction] {
        self.user_transactions
            .get(&user_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Get precomputed statistics for an attraction
    pub fn get_attraction_stats(&self, id: AttractionId) -> Option<&AttractionStats> {
        self.attraction_stats.get(&id)
    }

    /// Insert an item into the table (replaces an existing row with the same id)
    pub fn insert_item(&mut self, item: Item) {
        self.items.insert(item.attraction_id, item);
    }

    /// Append a transaction and update the per-user index
    pub fn insert_transaction(&mut self, transaction: Transaction) {
        self.user_transactions
            .entry(transaction.user_id)
            .or_default()
            .push(transaction);
        self.transactions.push(transaction);
    }

    /// Get counts (users, items, transactions) for logging
    pub fn counts(&self) -> (usize, usize, usize) {
        (
            self.user_transactions.len(),
            self.items.len(),
            self.transactions.len(),
        )
    }
}

impl Default for Dataset {
    fn default() -> Self {
        Self::new()
    }
}
