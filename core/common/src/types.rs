//! Common types used throughout Switchyard.

use bytes::Bytes;
use futures::Stream;
use serde_json::{Map, Value};
use std::fmt;
use std::pin::Pin;

/// A single piece of a streamed upload.
///
/// Streams handed to the dispatcher may yield raw bytes or text; both are
/// accepted and converted to bytes when the stream has to be buffered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    Bytes(Bytes),
    Text(String),
}

impl Chunk {
    /// Convert the chunk into its byte form.
    pub fn into_bytes(self) -> Bytes {
        match self {
            Chunk::Bytes(bytes) => bytes,
            Chunk::Text(text) => Bytes::from(text),
        }
    }

    /// Length of the chunk in bytes.
    pub fn len(&self) -> usize {
        match self {
            Chunk::Bytes(bytes) => bytes.len(),
            Chunk::Text(text) => text.len(),
        }
    }

    /// Check if the chunk carries no data.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Bytes> for Chunk {
    fn from(bytes: Bytes) -> Self {
        Chunk::Bytes(bytes)
    }
}

impl From<Vec<u8>> for Chunk {
    fn from(bytes: Vec<u8>) -> Self {
        Chunk::Bytes(Bytes::from(bytes))
    }
}

impl From<String> for Chunk {
    fn from(text: String) -> Self {
        Chunk::Text(text)
    }
}

impl From<&str> for Chunk {
    fn from(text: &str) -> Self {
        Chunk::Text(text.to_string())
    }
}

/// Chunk stream type for streamed uploads.
pub type ByteStream = Pin<Box<dyn Stream<Item = crate::Result<Chunk>> + Send>>;

/// A file travelling through the dispatch pipeline.
///
/// Carries either an in-memory buffer or a readable stream, plus the
/// metadata selection policies and providers look at. Providers may record
/// where the file ended up by setting `url` and `provider_metadata`.
pub struct FileDescriptor {
    /// Original file name (e.g. "avatar.png").
    pub name: String,
    /// Storage-friendly base name, used to build provider keys.
    pub hash: String,
    /// Extension including the leading dot (e.g. ".png"), or empty.
    pub ext: String,
    /// MIME type, if known.
    pub mime: Option<String>,
    /// Size in bytes, if known.
    pub size: Option<u64>,
    /// Optional logical folder path.
    pub path: Option<String>,
    /// Free-form metadata supplied by the caller.
    pub metadata: Map<String, Value>,
    /// In-memory contents.
    pub buffer: Option<Bytes>,
    /// Streamed contents.
    pub stream: Option<ByteStream>,
    /// Public URL set by the provider after upload.
    pub url: Option<String>,
    /// Provider-specific data set by the provider after upload.
    pub provider_metadata: Option<Value>,
}

impl FileDescriptor {
    /// Create a descriptor with no contents attached.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let (hash, ext) = split_name(&name);

        Self {
            name,
            hash,
            ext,
            mime: None,
            size: None,
            path: None,
            metadata: Map::new(),
            buffer: None,
            stream: None,
            url: None,
            provider_metadata: None,
        }
    }

    /// Create a descriptor backed by an in-memory buffer.
    ///
    /// The size is taken from the buffer.
    pub fn from_bytes(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let mut file = Self::new(name);
        file.size = Some(data.len() as u64);
        file.buffer = Some(data);
        file
    }

    /// Create a descriptor backed by a stream.
    pub fn from_stream(name: impl Into<String>, stream: ByteStream) -> Self {
        let mut file = Self::new(name);
        file.stream = Some(stream);
        file
    }

    /// Set the MIME type.
    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// Set the size in bytes.
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Override the storage base name.
    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = hash.into();
        self
    }

    /// Set the logical folder path.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Storage key for this file: `path/hash+ext`, or `hash+ext` without a path.
    pub fn key(&self) -> String {
        match self.path.as_deref().map(|p| p.trim_matches('/')) {
            Some(path) if !path.is_empty() => format!("{}/{}{}", path, self.hash, self.ext),
            _ => format!("{}{}", self.hash, self.ext),
        }
    }

    /// Detach the stream, leaving `None` in its place.
    pub fn take_stream(&mut self) -> Option<ByteStream> {
        self.stream.take()
    }
}

impl fmt::Debug for FileDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileDescriptor")
            .field("name", &self.name)
            .field("hash", &self.hash)
            .field("ext", &self.ext)
            .field("mime", &self.mime)
            .field("size", &self.size)
            .field("path", &self.path)
            .field("buffer", &self.buffer.as_ref().map(|b| b.len()))
            .field("stream", &self.stream.is_some())
            .field("url", &self.url)
            .finish()
    }
}

fn split_name(name: &str) -> (String, String) {
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => {
            (name[..idx].to_string(), name[idx..].to_lowercase())
        }
        _ => (name.to_string(), String::new()),
    }
}
