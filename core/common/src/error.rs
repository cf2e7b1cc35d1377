//! Common error types for Switchyard.

use thiserror::Error;

/// Error type shared by storage providers and the dispatcher internals.
#[derive(Debug, Error)]
pub enum Error {
    /// Storage operation failed inside a provider.
    #[error("Storage error: {0}")]
    Storage(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The provider does not implement the requested operation.
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Resource already exists.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// A configured limit was exceeded.
    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
