//! Uniform operation envelope around a provider.
//!
//! Every provider failure is logged and reported as
//! [`DispatchError::Operation`], whatever the provider's own error looked
//! like. Providers without native streaming get streamed files buffered in
//! memory and handed to their plain `upload`.

use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use tracing::debug;

use crate::config::FallbackOptions;
use crate::error::{DispatchError, Operation, Result};
use crate::log::LogSink;
use switchyard_common::{ByteStream, Error, FileDescriptor};
use switchyard_storage::{ProviderOutput, StorageProvider};

/// A provider wrapped for a single dispatch.
pub struct NormalizedProvider<'a> {
    key: &'a str,
    provider: &'a dyn StorageProvider,
    fallback: FallbackOptions,
    sink: &'a dyn LogSink,
}

/// Wrap `provider`, registered under `key`, for one operation.
pub fn normalize<'a>(
    key: &'a str,
    provider: &'a dyn StorageProvider,
    fallback: FallbackOptions,
    sink: &'a dyn LogSink,
) -> NormalizedProvider<'a> {
    NormalizedProvider {
        key,
        provider,
        fallback,
        sink,
    }
}

impl NormalizedProvider<'_> {
    pub async fn upload(&self, file: &mut FileDescriptor) -> Result<ProviderOutput> {
        let result = self.provider.upload(file).await;
        self.wrap(Operation::Upload, result)
    }

    pub async fn delete(&self, file: &mut FileDescriptor) -> Result<ProviderOutput> {
        let result = self.provider.delete(file).await;
        self.wrap(Operation::Delete, result)
    }

    /// Upload `file.stream`, natively if the provider can, buffered otherwise.
    ///
    /// The buffered path holds the whole stream in memory before the
    /// provider sees any of it. Without `max_buffer_bytes` there is no upper
    /// bound on that allocation.
    pub async fn upload_stream(&self, file: &mut FileDescriptor) -> Result<ProviderOutput> {
        let result = if self.provider.capabilities().upload_stream {
            self.provider.upload_stream(file).await
        } else {
            self.buffer_and_upload(file).await
        };
        self.wrap(Operation::UploadStream, result)
    }

    pub fn is_private(&self) -> bool {
        self.provider.is_private()
    }

    pub async fn signed_url(&self, file: &mut FileDescriptor) -> Result<Option<String>> {
        let result = self.provider.signed_url(file).await;
        self.wrap(Operation::SignedUrl, result)
    }

    async fn buffer_and_upload(
        &self,
        file: &mut FileDescriptor,
    ) -> switchyard_common::Result<ProviderOutput> {
        let stream = file.take_stream().ok_or_else(|| {
            Error::InvalidInput(format!("File '{}' has no stream to upload", file.name))
        })?;

        let buffer = drain(stream, self.fallback.max_buffer_bytes).await?;
        debug!(
            "Buffered {} bytes of '{}' for provider '{}'",
            buffer.len(),
            file.name,
            self.key
        );

        file.size.get_or_insert(buffer.len() as u64);
        file.buffer = Some(buffer);
        self.provider.upload(file).await
    }

    fn wrap<T>(&self, operation: Operation, result: switchyard_common::Result<T>) -> Result<T> {
        result.map_err(|err| {
            let err = DispatchError::Operation {
                operation,
                provider: self.key.to_string(),
                message: err.to_string(),
            };
            self.sink.error(&err.to_string());
            err
        })
    }
}

/// Read a stream to the end into one contiguous buffer, chunks in order.
///
/// # Errors
/// - The first error the stream yields
/// - `LimitExceeded` once more than `limit` bytes have arrived
pub async fn drain(mut stream: ByteStream, limit: Option<u64>) -> switchyard_common::Result<Bytes> {
    let mut buffer = BytesMut::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?.into_bytes();
        if let Some(limit) = limit {
            if (buffer.len() + chunk.len()) as u64 > limit {
                return Err(Error::LimitExceeded(format!(
                    "stream is larger than the {} byte buffering limit",
                    limit
                )));
            }
        }
        buffer.extend_from_slice(&chunk);
    }

    Ok(buffer.freeze())
}
