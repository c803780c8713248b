//! Error types for the binding pipeline
//!
//! Only genuinely fatal conditions are errors. Parse failures inside the
//! extractor and malformed class entries inside an IR document degrade to
//! smaller results and are reported through `tracing` instead.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for sol-weld operations
pub type WeldResult<T> = Result<T, WeldError>;

/// Main error type for sol-weld
#[derive(Debug, Error)]
pub enum WeldError {
    /// IO error on a specific file
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The IR document is structurally unusable
    #[error("Malformed IR document: {0}")]
    MalformedIr(String),

    /// Configuration file could not be parsed
    #[error("Configuration error in {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// Compilation database could not be interpreted
    #[error("Compilation database error: {0}")]
    CompileDatabase(String),

    /// The C++ frontend failed to produce a translation unit
    #[error("Frontend error: {0}")]
    Frontend(String),

    /// A stage produced nothing to work with
    #[error("No classes: {0}")]
    Empty(String),
}

impl WeldError {
    /// Wrap an IO error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        WeldError::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a malformed-IR error
    pub fn malformed(message: impl Into<String>) -> Self {
        WeldError::MalformedIr(message.into())
    }

    /// Create a frontend error
    pub fn frontend(message: impl Into<String>) -> Self {
        WeldError::Frontend(message.into())
    }
}
