//! Error types for the Assay library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Assay operations.
#[derive(Debug, Error)]
pub enum AssayError {
    /// The input file does not exist.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File extension not supported by any parser.
    #[error("Unsupported file type: {0} (use .csv, .json, or .xlsx)")]
    UnsupportedFormat(String),

    /// A reader for this format was not compiled in.
    #[error("{capability} support is not available: {hint}")]
    MissingOptionalCapability {
        capability: &'static str,
        hint: &'static str,
    },

    /// Input could not be decoded (invalid JSON, unreadable workbook, ...).
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Parsing succeeded but produced zero rows.
    #[error("No data found in file: {0}")]
    EmptyDataset(String),

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A parameter registry definition is invalid.
    #[error("Registry error: {0}")]
    Registry(String),
}

/// Result type alias for Assay operations.
pub type Result<T> = std::result::Result<T, AssayError>;
