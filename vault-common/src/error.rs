//! Common error types for the vault

use thiserror::Error;

/// Common result type for vault operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy for store and configuration operations
#[derive(Error, Debug)]
pub enum Error {
    /// Bad path shape, wrong extension, or traversal attempt
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Requested file or directory does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// File exists but its content is not in the expected format
    #[error("Invalid format: {0}")]
    Format(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
