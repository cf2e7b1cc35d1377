//! Public dispatch facade.

use std::sync::Arc;
use tracing::debug;

use crate::config::{DispatcherConfig, FallbackOptions, SelectionPolicy};
use crate::error::{DispatchError, Result};
use crate::loader::{load, ProviderRegistry};
use crate::log::{describe, LogSink, TracingSink};
use crate::normalizer::normalize;
use crate::selector::select;
use switchyard_common::FileDescriptor;
use switchyard_storage::{ProviderCatalog, ProviderOutput, StorageProvider};

/// Routes each file to one of the configured providers.
///
/// Every call selects and wraps a provider from scratch; nothing is cached
/// between calls, and the registry is never modified after `init`. A
/// dispatcher can be shared behind an `Arc` and used from many tasks.
pub struct Dispatcher {
    policy: Arc<dyn SelectionPolicy>,
    registry: ProviderRegistry,
    fallback: FallbackOptions,
    sink: Arc<dyn LogSink>,
}

impl Dispatcher {
    /// Build the dispatcher: validate `config` and resolve every provider.
    ///
    /// # Errors
    /// - `Config` for a missing policy or providers mapping
    /// - `ProviderResolution` if any provider cannot be built
    pub fn init(
        config: DispatcherConfig,
        catalog: &ProviderCatalog,
        sink: Arc<dyn LogSink>,
    ) -> Result<Self> {
        let registry = load(&config, catalog, sink.as_ref())?;
        // Unreachable after a successful load; kept to avoid an unwrap.
        let policy = config.select_provider.ok_or_else(|| {
            DispatchError::Config("config must define a select_provider policy".to_string())
        })?;

        sink.info(&format!(
            "Upload dispatcher ready with providers: {}",
            registry.keys().join(", ")
        ));

        Ok(Self {
            policy,
            registry,
            fallback: config.fallback,
            sink,
        })
    }

    /// [`Dispatcher::init`] logging through `tracing`.
    pub fn with_tracing(config: DispatcherConfig, catalog: &ProviderCatalog) -> Result<Self> {
        Self::init(config, catalog, Arc::new(TracingSink))
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Provider key `file` would be dispatched to.
    pub fn route(&self, file: &FileDescriptor) -> Result<String> {
        self.select(file).map(|(key, _)| key)
    }

    /// Upload a file held in `file.buffer`.
    pub async fn upload(&self, file: &mut FileDescriptor) -> Result<ProviderOutput> {
        let (key, provider) = self.select(file)?;
        normalize(&key, provider.as_ref(), self.fallback, self.sink.as_ref())
            .upload(file)
            .await
    }

    /// Upload a file held in `file.stream`.
    ///
    /// Providers without native streaming receive the stream fully buffered
    /// in `file.buffer`; see [`FallbackOptions`] for bounding that buffer.
    pub async fn upload_stream(&self, file: &mut FileDescriptor) -> Result<ProviderOutput> {
        let (key, provider) = self.select(file)?;
        normalize(&key, provider.as_ref(), self.fallback, self.sink.as_ref())
            .upload_stream(file)
            .await
    }

    /// Delete a file from the provider it routes to.
    pub async fn delete(&self, file: &mut FileDescriptor) -> Result<ProviderOutput> {
        let (key, provider) = self.select(file)?;
        normalize(&key, provider.as_ref(), self.fallback, self.sink.as_ref())
            .delete(file)
            .await
    }

    /// Whether the provider `file` routes to serves private files.
    pub fn is_private(&self, file: &FileDescriptor) -> Result<bool> {
        let (key, provider) = self.select(file)?;
        Ok(normalize(&key, provider.as_ref(), self.fallback, self.sink.as_ref()).is_private())
    }

    /// Signed URL for `file`, or `None` if its provider does not sign URLs.
    pub async fn signed_url(&self, file: &mut FileDescriptor) -> Result<Option<String>> {
        let (key, provider) = self.select(file)?;
        normalize(&key, provider.as_ref(), self.fallback, self.sink.as_ref())
            .signed_url(file)
            .await
    }

    /// View that reports per-call failures as `None` instead of an error.
    pub fn lenient(&self) -> Lenient<'_> {
        Lenient { dispatcher: self }
    }

    fn select(&self, file: &FileDescriptor) -> Result<(String, Arc<dyn StorageProvider>)> {
        select(file, self.policy.as_ref(), &self.registry, self.sink.as_ref())
    }
}

/// Null-on-error view of a [`Dispatcher`].
///
/// Failures are still logged where they happen, but the caller only sees
/// `None` and cannot tell a failed dispatch from an empty result.
pub struct Lenient<'a> {
    dispatcher: &'a Dispatcher,
}

impl Lenient<'_> {
    pub async fn upload(&self, file: &mut FileDescriptor) -> Option<ProviderOutput> {
        discard(self.dispatcher.upload(file).await)
    }

    pub async fn upload_stream(&self, file: &mut FileDescriptor) -> Option<ProviderOutput> {
        discard(self.dispatcher.upload_stream(file).await)
    }

    pub async fn delete(&self, file: &mut FileDescriptor) -> Option<ProviderOutput> {
        discard(self.dispatcher.delete(file).await)
    }
}

fn discard<T>(result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            debug!("Discarding dispatch error: {}", describe(&err));
            None
        }
    }
}
