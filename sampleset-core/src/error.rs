//! Error types for dataset operations

use std::io;
use thiserror::Error;

/// Result type for dataset operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for dataset operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error during file operations
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No record exists with the given id
    #[error("no sample found with ID '{0}'")]
    NotFound(String),

    /// Numeric or range addressing was used where only ids are supported
    #[error("invalid addressing: {0}")]
    InvalidAddressing(String),

    /// Operation intentionally left unimplemented
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// A sample references a field that is not declared in the schema
    #[error("field '{field}' is not declared in the schema of dataset '{dataset}'")]
    UndeclaredField {
        /// The undeclared field name
        field: String,
        /// The target dataset name
        dataset: String,
    },

    /// Schema mutation conflicts with the existing schema
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),
}
