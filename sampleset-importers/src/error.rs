//! Error types for dataset importers

use thiserror::Error;

/// Error type for dataset importers
#[derive(Error, Debug)]
pub enum Error {
    /// Core dataset error
    #[error("core error: {0}")]
    Core(#[from] sampleset_core::Error),

    /// I/O error during discovery or iteration
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON in an index file
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The importer cannot know its sample count ahead of iteration
    ///
    /// Distinct from a count of zero.
    #[error("the number of samples in a '{0}' is not known a priori")]
    LengthUnknown(&'static str),

    /// The orchestrator was given an importer/label_field combination it
    /// cannot dispatch
    #[error("unsupported importer type: {0}")]
    UnsupportedImporterType(String),

    /// Setup/iteration called outside the Unopened -> Open -> Closed order
    #[error("importer lifecycle error: {0}")]
    Lifecycle(String),

    /// Malformed on-disk dataset contents
    #[error("format error: {0}")]
    Format(String),
}

/// Result type for dataset importers
pub type Result<T> = std::result::Result<T, Error>;
