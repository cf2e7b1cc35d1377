//! In-memory storage provider for testing and development.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;
use uuid::Uuid;

use crate::provider::{Capabilities, ProviderOutput, StorageProvider};
use switchyard_common::{Error, FileDescriptor, Result};

/// Options accepted by the `memory` package.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MemoryOptions {
    /// Prefix for the URLs handed back to callers.
    pub base_url: String,
    /// Advertise native streaming instead of relying on buffering upstream.
    pub streaming: bool,
    /// Report stored files as private and hand out signed URLs.
    pub private: bool,
}

impl Default for MemoryOptions {
    fn default() -> Self {
        Self {
            base_url: "memory://local".to_string(),
            streaming: false,
            private: false,
        }
    }
}

/// In-memory storage provider.
///
/// Files are kept by key in a shared map and lost on drop. Clones share
/// the same map, so a test can keep a handle to inspect uploads.
#[derive(Clone)]
pub struct MemoryProvider {
    options: MemoryOptions,
    storage: Arc<RwLock<HashMap<String, Bytes>>>,
}

impl MemoryProvider {
    /// Create a new empty memory provider with default options.
    pub fn new() -> Self {
        Self::with_options(MemoryOptions::default())
    }

    /// Create a new empty memory provider.
    pub fn with_options(options: MemoryOptions) -> Self {
        Self {
            options,
            storage: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Build from raw provider options. `null` means defaults.
    pub fn from_options(options: Value) -> Result<Self> {
        if options.is_null() {
            return Ok(Self::new());
        }
        let options: MemoryOptions = serde_json::from_value(options)
            .map_err(|e| Error::InvalidInput(format!("Invalid memory provider options: {}", e)))?;
        Ok(Self::with_options(options))
    }

    /// Contents stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.storage.read().ok()?.get(key).cloned()
    }

    /// Number of stored files.
    pub fn len(&self) -> usize {
        self.storage.read().map(|s| s.len()).unwrap_or(0)
    }

    /// Check if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.options.base_url.trim_end_matches('/'), key)
    }

    fn store(&self, file: &mut FileDescriptor, data: Bytes) -> Result<ProviderOutput> {
        let key = file.key();
        let size = data.len();
        let url = self.url_for(&key);

        self.storage
            .write()
            .map_err(|_| Error::Storage("Memory store lock poisoned".to_string()))?
            .insert(key.clone(), data);
        debug!("Stored {} bytes under {}", size, key);

        file.url = Some(url.clone());
        file.provider_metadata = Some(json!({ "key": key }));

        Ok(json!({ "url": url, "key": key, "size": size }))
    }
}

impl Default for MemoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageProvider for MemoryProvider {
    fn name(&self) -> &str {
        "memory"
    }

    fn capabilities(&self) -> Capabilities {
        if self.options.streaming {
            Capabilities::STREAMING
        } else {
            Capabilities::BUFFERED
        }
    }

    async fn upload(&self, file: &mut FileDescriptor) -> Result<ProviderOutput> {
        let data = file
            .buffer
            .clone()
            .ok_or_else(|| Error::InvalidInput(format!("File '{}' has no buffer", file.name)))?;
        self.store(file, data)
    }

    async fn upload_stream(&self, file: &mut FileDescriptor) -> Result<ProviderOutput> {
        if !self.options.streaming {
            return Err(Error::NotImplemented(
                "Memory provider streaming is disabled".to_string(),
            ));
        }

        let mut stream = file
            .take_stream()
            .ok_or_else(|| Error::InvalidInput(format!("File '{}' has no stream", file.name)))?;

        let mut data = BytesMut::new();
        while let Some(chunk) = stream.next().await {
            data.extend_from_slice(&chunk?.into_bytes());
        }

        self.store(file, data.freeze())
    }

    async fn delete(&self, file: &mut FileDescriptor) -> Result<ProviderOutput> {
        let key = file.key();
        let removed = self
            .storage
            .write()
            .map_err(|_| Error::Storage("Memory store lock poisoned".to_string()))?
            .remove(&key)
            .is_some();

        Ok(json!({ "key": key, "deleted": removed }))
    }

    fn is_private(&self) -> bool {
        self.options.private
    }

    async fn signed_url(&self, file: &mut FileDescriptor) -> Result<Option<String>> {
        if !self.options.private {
            return Ok(None);
        }
        let key = file.key();
        if self.get(&key).is_none() {
            return Err(Error::NotFound(format!("File not found: {}", key)));
        }
        Ok(Some(format!("{}?token={}", self.url_for(&key), Uuid::new_v4())))
    }
}
