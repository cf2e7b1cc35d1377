//! Storage provider abstraction for Switchyard.
//!
//! Providers are pluggable backends exposing upload, stream upload and
//! delete. They are installed into a [`ProviderCatalog`] under a package
//! name and built from JSON options when the dispatcher starts.

pub mod memory;
pub mod provider;
pub mod registry;

pub use memory::{MemoryOptions, MemoryProvider};
pub use provider::{Capabilities, ProviderOutput, StorageProvider};
pub use registry::{create_default_catalog, ProviderCatalog, ProviderFactory};
