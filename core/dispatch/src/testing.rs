//! Test doubles shared by the dispatcher's unit tests.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::log::LogSink;
use switchyard_common::{Error, FileDescriptor, Result};
use switchyard_storage::{Capabilities, ProviderCatalog, ProviderOutput, StorageProvider};

/// Sink that keeps every line it receives.
#[derive(Default)]
pub struct RecordingSink {
    infos: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn infos(&self) -> Vec<String> {
        self.infos.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl LogSink for RecordingSink {
    fn info(&self, message: &str) {
        self.infos.lock().unwrap().push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

/// Provider that records what it was handed.
pub struct RecordingProvider {
    pub capabilities: Capabilities,
    output: Value,
    failure: Option<String>,
    uploads: Mutex<Vec<Bytes>>,
    pub streamed: AtomicUsize,
    pub deletes: AtomicUsize,
}

impl RecordingProvider {
    pub fn buffered() -> Self {
        Self {
            capabilities: Capabilities::BUFFERED,
            output: json!({ "url": "x" }),
            failure: None,
            uploads: Mutex::new(Vec::new()),
            streamed: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
        }
    }

    pub fn streaming() -> Self {
        Self {
            capabilities: Capabilities::STREAMING,
            ..Self::buffered()
        }
    }

    pub fn returning(output: Value) -> Self {
        Self {
            output,
            ..Self::buffered()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::buffered()
        }
    }

    /// Buffers passed to `upload`, in call order.
    pub fn uploads(&self) -> Vec<Bytes> {
        self.uploads.lock().unwrap().clone()
    }

    fn check(&self) -> Result<()> {
        match &self.failure {
            Some(message) => Err(Error::Storage(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl StorageProvider for RecordingProvider {
    fn name(&self) -> &str {
        "recording"
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    async fn upload(&self, file: &mut FileDescriptor) -> Result<ProviderOutput> {
        self.check()?;
        let buffer = file.buffer.clone().unwrap_or_default();
        self.uploads.lock().unwrap().push(buffer);
        Ok(self.output.clone())
    }

    async fn upload_stream(&self, file: &mut FileDescriptor) -> Result<ProviderOutput> {
        self.check()?;
        self.streamed.fetch_add(1, Ordering::SeqCst);
        if let Some(mut stream) = file.take_stream() {
            let mut data = BytesMut::new();
            while let Some(chunk) = stream.next().await {
                data.extend_from_slice(&chunk?.into_bytes());
            }
            file.size = Some(data.len() as u64);
        }
        Ok(self.output.clone())
    }

    async fn delete(&self, _file: &mut FileDescriptor) -> Result<ProviderOutput> {
        self.check()?;
        self.deletes.fetch_add(1, Ordering::SeqCst);
        Ok(json!({ "deleted": true }))
    }
}

/// Provider that only implements upload.
pub struct UploadOnly;

#[async_trait]
impl StorageProvider for UploadOnly {
    fn name(&self) -> &str {
        "upload-only"
    }

    async fn upload(&self, _file: &mut FileDescriptor) -> Result<ProviderOutput> {
        Ok(json!({ "url": "upload-only" }))
    }
}

/// Catalog whose packages hand out the given shared instances.
pub fn catalog_with(packages: Vec<(&str, Arc<dyn StorageProvider>)>) -> ProviderCatalog {
    let mut catalog = ProviderCatalog::new();
    for (name, provider) in packages {
        catalog
            .register(name, Box::new(move |_| Ok(provider.clone())))
            .unwrap();
    }
    catalog
}
