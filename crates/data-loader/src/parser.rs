//! Parser for the tourism data files.
//!
//! Both tables arrive as CSV exports of the source spreadsheets:
//! - Transaction.csv: `UserId,AttractionId,Rating` (plus any extra columns)
//! - Item.csv: `AttractionId,Attraction` (plus any extra columns)
//!
//! Columns are matched by header name, so their order doesn't matter and
//! unrelated columns (visit year, visit mode, ...) are ignored.
//!
//! Rust concepts you'll learn here:
//! - Deserializing rows with serde + the `csv` crate
//! - Generic readers (`R: Read`) so parsing can be tested without files
//! - Error handling with `?` and `map_err`

use crate::error::{DataLoadError, Result};
use crate::types::*;
use serde::Deserialize;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

/// Columns the transaction table must provide
pub const TRANSACTION_COLUMNS: [&str; 3] = ["UserId", "AttractionId", "Rating"];

/// Columns the item table must provide
pub const ITEM_COLUMNS: [&str; 2] = ["AttractionId", "Attraction"];

/// Raw shape of one transaction row
#[derive(Debug, Deserialize)]
struct TransactionRecord {
    #[serde(rename = "UserId")]
    user_id: UserId,
    #[serde(rename = "AttractionId")]
    attraction_id: AttractionId,
    #[serde(rename = "Rating")]
    rating: f64,
}

/// Raw shape of one item row
#[derive(Debug, Deserialize)]
struct ItemRecord {
    #[serde(rename = "AttractionId")]
    attraction_id: AttractionId,
    #[serde(rename = "Attraction")]
    name: String,
}

/// Open a file, turning "not found" into our own error variant
fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => DataLoadError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => DataLoadError::IoError(e),
    })
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(false)
        .from_reader(reader)
}

/// Check the header row contains every required column
fn require_columns(headers: &csv::StringRecord, file: &str, required: &[&str]) -> Result<()> {
    for column in required {
        if !headers.iter().any(|header| header == *column) {
            return Err(DataLoadError::MissingColumn {
                file: file.to_string(),
                column: column.to_string(),
            });
        }
    }
    Ok(())
}

/// Convert a csv deserialization failure into a line-tagged ParseError
fn parse_error(file: &str, fallback_line: usize, err: csv::Error) -> DataLoadError {
    let line = err
        .position()
        .map(|pos| pos.line() as usize)
        .unwrap_or(fallback_line);
    DataLoadError::ParseError {
        file: file.to_string(),
        line,
        reason: err.to_string(),
    }
}

/// Parse the transaction table from any reader
///
/// `file` is only used to label errors.
pub fn parse_transactions_from_reader<R: Read>(reader: R, file: &str) -> Result<Vec<Transaction>> {
    let mut rdr = csv_reader(reader);
    let headers = rdr.headers()?.clone();
    require_columns(&headers, file, &TRANSACTION_COLUMNS)?;

    let mut transactions = Vec::new();
    for (idx, row) in rdr.deserialize::<TransactionRecord>().enumerate() {
        // +2: one for the header, one for 1-based numbering
        let record = row.map_err(|e| parse_error(file, idx + 2, e))?;
        if !record.rating.is_finite() {
            return Err(DataLoadError::ParseError {
                file: file.to_string(),
                line: idx + 2,
                reason: format!("Invalid rating: {}", record.rating),
            });
        }
        transactions.push(Transaction::new(
            record.user_id,
            record.attraction_id,
            record.rating,
        ));
    }

    Ok(transactions)
}

/// Parse the item table from any reader
pub fn parse_items_from_reader<R: Read>(reader: R, file: &str) -> Result<Vec<Item>> {
    let mut rdr = csv_reader(reader);
    let headers = rdr.headers()?.clone();
    require_columns(&headers, file, &ITEM_COLUMNS)?;

    let mut items = Vec::new();
    for (idx, row) in rdr.deserialize::<ItemRecord>().enumerate() {
        let record = row.map_err(|e| parse_error(file, idx + 2, e))?;
        items.push(Item::new(record.attraction_id, record.name));
    }

    Ok(items)
}

/// Parse the Transaction.csv file
pub fn parse_transactions(path: &Path) -> Result<Vec<Transaction>> {
    parse_transactions_from_reader(open(path)?, &file_label(path))
}

/// Parse the Item.csv file
pub fn parse_items(path: &Path) -> Result<Vec<Item>> {
    parse_items_from_reader(open(path)?, &file_label(path))
}
