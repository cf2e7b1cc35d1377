//! Provider catalog for resolving provider packages by name.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::provider::StorageProvider;
use switchyard_common::{Error, Result};

/// Factory function type for creating providers from their options.
pub type ProviderFactory = Box<dyn Fn(Value) -> Result<Arc<dyn StorageProvider>> + Send + Sync>;

/// Catalog of installed provider packages.
///
/// Maps a package name (what a provider config's `provider` field refers
/// to) to the factory that builds an instance from provider options.
pub struct ProviderCatalog {
    factories: HashMap<String, ProviderFactory>,
}

impl ProviderCatalog {
    /// Create a new empty catalog.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a provider factory.
    ///
    /// # Preconditions
    /// - `name` is not registered yet
    ///
    /// # Postconditions
    /// - `resolve(name, ..)` calls `factory`
    ///
    /// # Errors
    /// - Returns error if name is already registered
    pub fn register(&mut self, name: impl Into<String>, factory: ProviderFactory) -> Result<()> {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return Err(Error::AlreadyExists(format!(
                "Provider '{}' is already registered",
                name
            )));
        }
        self.factories.insert(name, factory);
        Ok(())
    }

    /// Build a provider instance from a package name and its options.
    ///
    /// # Preconditions
    /// - `name` was registered
    ///
    /// # Postconditions
    /// - The catalog itself is unchanged
    ///
    /// # Errors
    /// - Package not registered
    /// - Options rejected by the factory
    pub fn resolve(&self, name: &str, options: Value) -> Result<Arc<dyn StorageProvider>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| Error::NotFound(format!("Provider '{}' is not registered", name)))?;
        factory(options)
    }

    /// Registered package names, sorted.
    pub fn providers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a package is registered.
    pub fn has_provider(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }
}

impl Default for ProviderCatalog {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a catalog with the bundled providers.
pub fn create_default_catalog() -> ProviderCatalog {
    let mut catalog = ProviderCatalog::new();

    catalog.factories.insert(
        "memory".to_string(),
        Box::new(|options| Ok(Arc::new(crate::memory::MemoryProvider::from_options(options)?))),
    );

    catalog
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryProvider;

    #[test]
    fn test_register_and_resolve() {
        let mut catalog = ProviderCatalog::new();

        catalog
            .register("test", Box::new(|_| Ok(Arc::new(MemoryProvider::new()))))
            .unwrap();

        let provider = catalog.resolve("test", Value::Null).unwrap();
        assert_eq!(provider.name(), "memory");
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut catalog = ProviderCatalog::new();

        catalog
            .register("test", Box::new(|_| Ok(Arc::new(MemoryProvider::new()))))
            .unwrap();

        let result = catalog.register("test", Box::new(|_| Ok(Arc::new(MemoryProvider::new()))));
        assert!(matches!(result, Err(Error::AlreadyExists(_))));
    }

    #[test]
    fn test_resolve_unknown_fails() {
        let catalog = ProviderCatalog::new();
        let result = catalog.resolve("unknown", Value::Null);
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_factory_error_is_returned() {
        let mut catalog = ProviderCatalog::new();
        catalog
            .register(
                "picky",
                Box::new(|_| Err(Error::InvalidInput("bucket is required".to_string()))),
            )
            .unwrap();

        let err = catalog.resolve("picky", Value::Null).err().unwrap();
        assert!(err.to_string().contains("bucket is required"));
    }

    #[test]
    fn test_default_catalog() {
        let catalog = create_default_catalog();
        assert_eq!(catalog.providers(), vec!["memory".to_string()]);
        assert!(catalog.has_provider("memory"));

        let provider = catalog
            .resolve("memory", serde_json::json!({"streaming": true}))
            .unwrap();
        assert!(provider.capabilities().upload_stream);
    }
}
