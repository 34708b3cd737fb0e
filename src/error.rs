//! Error types for the swedeb library.
//!
//! All errors are represented by the [`SwedebError`] enum. Compiler and codec
//! specification errors are caller or configuration defects and are never
//! recovered locally; unmapped categorical values are not errors at all and
//! never reach this type.
//!
//! # Examples
//!
//! ```
//! use swedeb::error::{Result, SwedebError};
//!
//! fn compile() -> Result<String> {
//!     Err(SwedebError::query("target is mandatory"))
//! }
//!
//! assert!(compile().is_err());
//! ```

use std::io;

use thiserror::Error;

/// The main error type for swedeb operations.
#[derive(Error, Debug)]
pub enum SwedebError {
    /// I/O errors (codec sources, temp directories)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Query compilation errors (missing target, inverted interval)
    #[error("Query error: {0}")]
    Query(String),

    /// Codec specification errors (unresolvable or identity mapping)
    #[error("Codec error: {0}")]
    Codec(String),

    /// Missing codec source file or table
    #[error("Source error: {0}")]
    Source(String),

    /// Frame column lookups and shape mismatches
    #[error("Column error: {0}")]
    Column(String),

    /// Errors reported by the external corpus engine
    #[error("Engine error: {0}")]
    Engine(String),

    /// Worker pool failures in the year partitioner
    #[error("Partition error: {0}")]
    Partition(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV reader errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Arrow kernel errors (casts, concatenation, sorting)
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with SwedebError.
pub type Result<T> = std::result::Result<T, SwedebError>;

impl SwedebError {
    /// Create a new query error.
    pub fn query<S: Into<String>>(msg: S) -> Self {
        SwedebError::Query(msg.into())
    }

    /// Create a new codec error.
    pub fn codec<S: Into<String>>(msg: S) -> Self {
        SwedebError::Codec(msg.into())
    }

    /// Create a new source error.
    pub fn missing_source<S: Into<String>>(msg: S) -> Self {
        SwedebError::Source(msg.into())
    }

    /// Create a new column error.
    pub fn column<S: Into<String>>(msg: S) -> Self {
        SwedebError::Column(msg.into())
    }

    /// Create a new engine error.
    pub fn engine<S: Into<String>>(msg: S) -> Self {
        SwedebError::Engine(msg.into())
    }

    /// Create a new partition error.
    pub fn partition<S: Into<String>>(msg: S) -> Self {
        SwedebError::Partition(msg.into())
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        SwedebError::InvalidConfig(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        SwedebError::Other(msg.into())
    }

    /// Create a new not found error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        SwedebError::Source(format!("Not found: {}", msg.into()))
    }
}
