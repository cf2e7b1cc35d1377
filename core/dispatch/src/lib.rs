//! Switchyard dispatcher.
//!
//! Routes each file to one of several configured storage providers:
//! - A caller-supplied selection policy maps the file to a provider key
//! - Provider operations are wrapped in one error envelope
//! - Streams are buffered for providers without native streaming
//!
//! Per-call failures are returned as typed [`DispatchError`]s; the
//! [`Lenient`] view keeps the older null-on-error contract.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod loader;
pub mod log;
pub mod normalizer;
pub mod selector;

#[cfg(test)]
mod testing;

pub use config::{
    DispatchSettings, DispatcherConfig, FallbackOptions, ProviderConfig, RuleSelector,
    SelectionPolicy, SelectionRule,
};
pub use dispatcher::{Dispatcher, Lenient};
pub use error::{BoxError, DispatchError, Operation, Result};
pub use loader::{load, ProviderRegistry};
pub use log::{LogSink, TracingSink};
pub use normalizer::{normalize, NormalizedProvider};
pub use selector::select;
