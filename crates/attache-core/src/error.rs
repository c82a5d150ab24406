//! Error types for attache.

use thiserror::Error;

/// Result type alias using attache's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for attache operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found (e.g. a transient file whose backing data is gone)
    #[error("Not found: {0}")]
    NotFound(String),

    /// File name rejected by the injection guard
    #[error("Illegal file name: {0}")]
    IllegalName(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
