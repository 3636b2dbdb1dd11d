//! Error handling for schema resolution and export.

use std::{fmt, io};

use arrow::error::ArrowError;
use parquet::errors::ParquetError;

/// A malformed or contradictory form schema. Always fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// Two schema nodes resolve to the same canonical path
    #[error("Path collision at '{path}'")]
    PathCollision { path: String },

    /// A node name that cannot be used as a path segment
    #[error("Invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// A multi-select field lists the same option twice
    #[error("Option '{option}' declared twice for '{path}'")]
    DuplicateOption { path: String, option: String },

    /// The survey document does not name its root group
    #[error("Survey document has no root name")]
    MissingRoot,
}

/// Specialized error type for export operations
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Schema could not be resolved
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Error opening, reading or writing a file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error decoding a schema or instance document
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error building or writing columnar data
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// Error writing parquet output
    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    /// A submission document that has no usable root group
    #[error("Invalid instance: {0}")]
    InvalidInstance(String),

    /// A background loading task failed
    #[error("Task error: {0}")]
    Join(String),
}

/// Result type for export operations
pub type Result<T> = std::result::Result<T, ExportError>;

/// An instance referenced a path the schema does not declare.
///
/// Never raised; the field is left out of every output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFieldWarning {
    pub path: String,
}

impl UnknownFieldWarning {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl fmt::Display for UnknownFieldWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown field '{}' ignored", self.path)
    }
}
