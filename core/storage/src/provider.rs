//! Storage provider trait definition.

use async_trait::async_trait;

use switchyard_common::{Error, FileDescriptor, Result};

/// Value a provider returns from an operation, passed back to the caller untouched.
pub type ProviderOutput = serde_json::Value;

/// Streaming support a provider advertises.
///
/// Upload and delete need no flag: a provider that leaves either slot
/// unimplemented inherits a body that fails with [`Error::NotImplemented`].
/// Streaming is different, because a provider without it gets streamed
/// files buffered for it and handed to `upload` instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub upload_stream: bool,
}

impl Capabilities {
    /// No native streaming; streams are buffered upstream.
    pub const BUFFERED: Self = Self {
        upload_stream: false,
    };

    /// Native streaming through `upload_stream`.
    pub const STREAMING: Self = Self {
        upload_stream: true,
    };
}

/// Storage provider trait for pluggable backends.
///
/// Every operation has a default body that fails with
/// [`Error::NotImplemented`], so a provider only writes the slots it
/// supports. Files are passed mutably: providers record `url` and
/// `provider_metadata` on the descriptor, and streams are consumed from it.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Get the provider name (e.g., "memory", "s3").
    fn name(&self) -> &str;

    /// Streaming support. Defaults to [`Capabilities::BUFFERED`].
    fn capabilities(&self) -> Capabilities {
        Capabilities::BUFFERED
    }

    /// Upload a file whose contents are in `file.buffer`.
    ///
    /// # Preconditions
    /// - `file.buffer` holds the complete content
    ///
    /// # Postconditions
    /// - File is stored under the provider's key for it
    /// - `file.url` is set when the provider serves files by URL
    ///
    /// # Errors
    /// - Missing buffer
    /// - Backend failures
    /// - `NotImplemented` if the provider has no upload slot
    async fn upload(&self, _file: &mut FileDescriptor) -> Result<ProviderOutput> {
        Err(Error::NotImplemented(format!(
            "Provider '{}' does not implement upload",
            self.name()
        )))
    }

    /// Upload a file whose contents are in `file.stream`.
    ///
    /// # Preconditions
    /// - [`Capabilities::upload_stream`] is set; otherwise the dispatcher
    ///   never calls this
    /// - `file.stream` is present
    ///
    /// # Postconditions
    /// - The stream has been consumed
    async fn upload_stream(&self, _file: &mut FileDescriptor) -> Result<ProviderOutput> {
        Err(Error::NotImplemented(format!(
            "Provider '{}' does not implement upload_stream",
            self.name()
        )))
    }

    /// Delete a previously uploaded file.
    ///
    /// # Postconditions
    /// - Nothing is stored under the file's key
    ///
    /// # Errors
    /// - Backend failures
    /// - `NotImplemented` if the provider has no delete slot
    async fn delete(&self, _file: &mut FileDescriptor) -> Result<ProviderOutput> {
        Err(Error::NotImplemented(format!(
            "Provider '{}' does not implement delete",
            self.name()
        )))
    }

    /// Whether files stored by this provider need signed URLs to be read.
    fn is_private(&self) -> bool {
        false
    }

    /// Produce a signed URL for a stored file.
    ///
    /// # Preconditions
    /// - The file was uploaded through this provider
    ///
    /// # Returns
    /// `None` when the provider does not sign URLs.
    async fn signed_url(&self, _file: &mut FileDescriptor) -> Result<Option<String>> {
        Ok(None)
    }
}
