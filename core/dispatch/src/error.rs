//! Error taxonomy of the dispatcher.

use std::fmt;
use thiserror::Error;

/// Boxed error produced by untrusted code such as selection policies.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Operation a normalized provider was asked to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Upload,
    UploadStream,
    Delete,
    SignedUrl,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Upload => "upload",
            Operation::UploadStream => "upload_stream",
            Operation::Delete => "delete",
            Operation::SignedUrl => "signed_url",
        };
        f.write_str(name)
    }
}

/// Errors surfaced by the dispatcher.
///
/// `Config` and `ProviderResolution` only occur during initialization and
/// abort it. The remaining variants are per call.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Initialization config is missing or malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A configured provider package could not be resolved or built.
    #[error("Provider package '{provider}' for key '{key}' is not available: {reason}")]
    ProviderResolution {
        key: String,
        provider: String,
        reason: String,
    },

    /// The selection policy failed. The cause is kept as the error source.
    #[error("The selection policy failed to pick a provider")]
    Selection {
        #[source]
        source: BoxError,
    },

    /// The selection policy returned a key with no registered provider.
    #[error("No upload provider registered under key '{0}'")]
    UnknownProvider(String),

    /// A provider operation failed.
    #[error("{operation} failed on provider '{provider}': {message}")]
    Operation {
        operation: Operation,
        provider: String,
        message: String,
    },
}

/// A selection policy panicked instead of returning.
#[derive(Debug, Error)]
#[error("selection policy panicked: {0}")]
pub struct PolicyPanic(pub String);

/// Result type alias for dispatcher operations.
pub type Result<T> = std::result::Result<T, DispatchError>;
