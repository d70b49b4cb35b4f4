//! Error types for the data-loader crate.
//!
//! Rust error handling concepts demonstrated:
//! - thiserror for defining custom error types
//! - Enum variants for different error cases
//! - `#[from]` conversions so `?` works on I/O and CSV errors

use thiserror::Error;

/// Errors that can occur while loading the transaction and item tables
///
/// `MissingColumn`, `ParseError` and `InvalidValue` are the "data format"
/// failures: the input table does not have the shape the recommender needs.
/// All of them abort the load.
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The CSV reader itself failed (bad quoting, invalid UTF-8, ...)
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is absent from the header row
    #[error("Missing required column '{column}' in {file}")]
    MissingColumn { file: String, column: String },

    /// A record couldn't be parsed into its typed form
    ///
    /// `line` is the 1-based line in the file (the header is line 1)
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: usize,
        reason: String,
    },

    /// A data field had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// The item table lists the same AttractionId twice
    #[error("Duplicate item row for attraction {id}")]
    DuplicateItem { id: u32 },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
