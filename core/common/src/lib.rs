//! Common types shared across Switchyard crates.
//!
//! This module provides the error type used by storage providers and the
//! file descriptor that travels through the dispatch pipeline.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{ByteStream, Chunk, FileDescriptor};
