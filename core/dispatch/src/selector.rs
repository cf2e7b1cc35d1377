//! Provider selection.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::config::SelectionPolicy;
use crate::error::{DispatchError, PolicyPanic, Result};
use crate::loader::ProviderRegistry;
use crate::log::{describe, LogSink};
use switchyard_common::FileDescriptor;
use switchyard_storage::StorageProvider;

/// Run the policy once for `file` and resolve the key it returns.
///
/// Policy errors and panics both become [`DispatchError::Selection`] with
/// the original failure as the source.
pub fn select(
    file: &FileDescriptor,
    policy: &dyn SelectionPolicy,
    registry: &ProviderRegistry,
    sink: &dyn LogSink,
) -> Result<(String, Arc<dyn StorageProvider>)> {
    let key = run_policy(file, policy).map_err(|err| {
        sink.error(&describe(&err));
        err
    })?;

    let provider = registry.get(&key).cloned().ok_or_else(|| {
        let err = DispatchError::UnknownProvider(key.clone());
        sink.error(&err.to_string());
        err
    })?;

    sink.info(&format!("Selected provider '{}' for '{}'", key, file.name));
    Ok((key, provider))
}

fn run_policy(file: &FileDescriptor, policy: &dyn SelectionPolicy) -> Result<String> {
    match panic::catch_unwind(AssertUnwindSafe(|| policy.select_provider(file))) {
        Ok(Ok(key)) => Ok(key),
        Ok(Err(source)) => Err(DispatchError::Selection { source }),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            Err(DispatchError::Selection {
                source: Box::new(PolicyPanic(message)),
            })
        }
    }
}
