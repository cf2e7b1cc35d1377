//! Provider registry loading.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::DispatcherConfig;
use crate::error::{DispatchError, Result};
use crate::log::LogSink;
use switchyard_storage::{ProviderCatalog, StorageProvider};

/// Live providers by key.
///
/// Built once by [`load`] and never modified afterwards, so it can be
/// shared freely between concurrent dispatches.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Arc<dyn StorageProvider>>,
}

impl ProviderRegistry {
    /// Look up a provider by key.
    pub fn get(&self, key: &str) -> Option<&Arc<dyn StorageProvider>> {
        self.providers.get(key)
    }

    /// Check if a key is registered.
    pub fn contains(&self, key: &str) -> bool {
        self.providers.contains_key(key)
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// Resolve every configured provider into a registry.
///
/// # Errors
/// - `Config` if the selection policy or the providers mapping is missing,
///   or the mapping is empty. Nothing is resolved in that case.
/// - `ProviderResolution` for the first entry whose package is unknown or
///   whose factory rejects its options. No registry is returned, even if
///   other entries resolved.
pub fn load(
    config: &DispatcherConfig,
    catalog: &ProviderCatalog,
    sink: &dyn LogSink,
) -> Result<ProviderRegistry> {
    if config.select_provider.is_none() {
        return Err(config_error(sink, "config must define a select_provider policy"));
    }

    let entries = match &config.providers {
        None => return Err(config_error(sink, "config must define a providers mapping")),
        Some(entries) if entries.is_empty() => {
            return Err(config_error(sink, "providers mapping must not be empty"))
        }
        Some(entries) => entries,
    };

    let mut providers = BTreeMap::new();
    for (key, entry) in entries {
        let instance = catalog
            .resolve(&entry.provider, entry.provider_options.clone())
            .map_err(|err| {
                let err = DispatchError::ProviderResolution {
                    key: key.clone(),
                    provider: entry.provider.clone(),
                    reason: err.to_string(),
                };
                sink.error(&err.to_string());
                err
            })?;

        sink.info(&format!(
            "Resolved provider '{}' with package '{}'",
            key, entry.provider
        ));
        providers.insert(key.clone(), instance);
    }

    Ok(ProviderRegistry { providers })
}

fn config_error(sink: &dyn LogSink, message: &str) -> DispatchError {
    sink.error(message);
    DispatchError::Config(message.to_string())
}
