//! Error types for pquery

use thiserror::Error;

/// Core error type raised by connections and drivers
#[derive(Error, Debug)]
pub enum PqueryError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for pquery operations
pub type Result<T> = std::result::Result<T, PqueryError>;
