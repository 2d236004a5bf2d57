//! Error types for the finlens library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for finlens operations.
#[derive(Debug, Error)]
pub enum FinlensError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Empty file or no data to analyze.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Malformed table (ragged rows, unequal column lengths).
    #[error("Profiling error: {0}")]
    Profiling(String),

    /// No reconciliation strategy could combine the inputs.
    #[error("Merge error: {0}")]
    Merge(#[from] MergeError),

    /// Query matched a denylisted keyword.
    #[error("Unsafe query: operation '{keyword}' is not allowed")]
    UnsafeQuery { keyword: String },

    /// The query engine rejected or failed to run the query.
    #[error("Query execution error: {0}")]
    QueryExecution(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reasons a merge can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    /// Nothing to merge.
    #[error("no tables supplied")]
    NoInput,

    /// Every enabled strategy declined the inputs.
    #[error("no reconciliation strategy applies to {files:?}")]
    NoStrategy { files: Vec<String> },
}

impl FinlensError {
    /// Returns true for errors the caller can fix by changing the query.
    pub fn is_query_error(&self) -> bool {
        matches!(
            self,
            FinlensError::UnsafeQuery { .. } | FinlensError::QueryExecution(_)
        )
    }
}

/// Result type alias for finlens operations.
pub type Result<T> = std::result::Result<T, FinlensError>;
