//! Log sink injected into the dispatcher.

use std::error::Error as StdError;

/// Destination for dispatcher diagnostics.
///
/// The host decides where these lines go. Nothing the sink does feeds back
/// into dispatch decisions.
pub trait LogSink: Send + Sync {
    fn info(&self, message: &str);
    fn error(&self, message: &str);
}

/// Sink that forwards to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn info(&self, message: &str) {
        tracing::info!(target: "switchyard", "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "switchyard", "{}", message);
    }
}

/// Render an error followed by its chain of causes.
pub fn describe(err: &(dyn StdError + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DispatchError;

    #[test]
    fn test_describe_includes_cause() {
        let err = DispatchError::Selection {
            source: "no rule for video/mp4".into(),
        };

        assert_eq!(
            describe(&err),
            "The selection policy failed to pick a provider: no rule for video/mp4"
        );
    }
}
