//! Common error types for artcard

use thiserror::Error;

/// Common result type for artcard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the pipeline and utilities
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Document could not be parsed (missing or malformed front matter)
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// YAML (de)serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
