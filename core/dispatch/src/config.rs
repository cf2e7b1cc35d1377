//! Dispatcher configuration.
//!
//! [`DispatcherConfig`] is what the dispatcher is initialized with: a
//! selection policy plus a mapping of provider key to provider package and
//! options. [`DispatchSettings`] is the JSON file form of the same thing,
//! with the policy expressed as declarative [`RuleSelector`] rules.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::error::{BoxError, DispatchError, Result};
use switchyard_common::FileDescriptor;

/// Maps a file to the key of the provider that should store it.
///
/// Policies are caller code; the dispatcher treats any error or panic they
/// produce as a selection failure.
pub trait SelectionPolicy: Send + Sync {
    fn select_provider(&self, file: &FileDescriptor) -> std::result::Result<String, BoxError>;
}

impl<F> SelectionPolicy for F
where
    F: Fn(&FileDescriptor) -> std::result::Result<String, BoxError> + Send + Sync,
{
    fn select_provider(&self, file: &FileDescriptor) -> std::result::Result<String, BoxError> {
        self(file)
    }
}

/// One configured provider entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Package name to resolve in the provider catalog.
    pub provider: String,
    /// Options handed to the package's factory.
    #[serde(default)]
    pub provider_options: Value,
}

impl ProviderConfig {
    pub fn new(provider: impl Into<String>, provider_options: Value) -> Self {
        Self {
            provider: provider.into(),
            provider_options,
        }
    }
}

/// Behavior of the stream buffering fallback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackOptions {
    /// Largest stream, in bytes, the fallback will buffer.
    ///
    /// `None` buffers without limit, so a large enough stream can exhaust
    /// memory.
    #[serde(default)]
    pub max_buffer_bytes: Option<u64>,
}

impl FallbackOptions {
    /// Cap buffered streams at `bytes`.
    pub fn capped(bytes: u64) -> Self {
        Self {
            max_buffer_bytes: Some(bytes),
        }
    }
}

/// Initialization input for the dispatcher.
///
/// Both `select_provider` and `providers` are required; they are optional
/// here so that a missing one is reported as a config error at startup.
#[derive(Clone, Default)]
pub struct DispatcherConfig {
    pub select_provider: Option<Arc<dyn SelectionPolicy>>,
    pub providers: Option<BTreeMap<String, ProviderConfig>>,
    pub fallback: FallbackOptions,
}

impl DispatcherConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the selection policy.
    pub fn with_select_provider<P>(mut self, policy: P) -> Self
    where
        P: SelectionPolicy + 'static,
    {
        self.select_provider = Some(Arc::new(policy));
        self
    }

    /// Set the selection policy from a closure.
    pub fn with_select_fn<F>(self, policy: F) -> Self
    where
        F: Fn(&FileDescriptor) -> std::result::Result<String, BoxError> + Send + Sync + 'static,
    {
        self.with_select_provider(policy)
    }

    /// Add a provider entry under `key`.
    pub fn with_provider(mut self, key: impl Into<String>, provider: ProviderConfig) -> Self {
        self.providers
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), provider);
        self
    }

    /// Set fallback buffering options.
    pub fn with_fallback(mut self, fallback: FallbackOptions) -> Self {
        self.fallback = fallback;
        self
    }
}

/// Condition-to-provider rule. All set conditions must hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionRule {
    /// Provider key to route to when the rule matches.
    pub provider: String,
    /// Case-insensitive prefix of the file's MIME type, e.g. `image/`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_prefix: Option<String>,
    /// Extension, with or without the leading dot. Case-insensitive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<u64>,
}

impl SelectionRule {
    /// Rule that always matches.
    pub fn to(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            mime_prefix: None,
            ext: None,
            min_size: None,
            max_size: None,
        }
    }

    /// Check the rule against a file. A size bound never matches a file of unknown size.
    pub fn matches(&self, file: &FileDescriptor) -> bool {
        if let Some(prefix) = &self.mime_prefix {
            match &file.mime {
                Some(mime)
                    if mime
                        .get(..prefix.len())
                        .is_some_and(|head| head.eq_ignore_ascii_case(prefix)) => {}
                _ => return false,
            }
        }

        if let Some(ext) = &self.ext {
            let wanted = ext.trim_start_matches('.');
            let actual = file.ext.trim_start_matches('.');
            if !wanted.eq_ignore_ascii_case(actual) {
                return false;
            }
        }

        if self.min_size.is_some() || self.max_size.is_some() {
            let Some(size) = file.size else {
                return false;
            };
            if self.min_size.is_some_and(|min| size < min) {
                return false;
            }
            if self.max_size.is_some_and(|max| size > max) {
                return false;
            }
        }

        true
    }
}

/// Declarative selection policy: first matching rule wins, then `default`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSelector {
    #[serde(default)]
    pub rules: Vec<SelectionRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl SelectionPolicy for RuleSelector {
    fn select_provider(&self, file: &FileDescriptor) -> std::result::Result<String, BoxError> {
        self.rules
            .iter()
            .find(|rule| rule.matches(file))
            .map(|rule| rule.provider.clone())
            .or_else(|| self.default.clone())
            .ok_or_else(|| {
                format!(
                    "no selection rule matches '{}' and no default provider is set",
                    file.name
                )
                .into()
            })
    }
}

/// File form of the dispatcher configuration.
///
/// ```json
/// {
///   "selection": {
///     "rules": [{ "mime_prefix": "image/", "provider": "images" }],
///     "default": "files"
///   },
///   "providers": {
///     "images": { "provider": "memory", "provider_options": { "streaming": true } },
///     "files": { "provider": "memory" }
///   },
///   "fallback": { "max_buffer_bytes": 10485760 }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DispatchSettings {
    #[serde(default)]
    pub selection: Option<RuleSelector>,
    #[serde(default)]
    pub providers: Option<BTreeMap<String, ProviderConfig>>,
    #[serde(default)]
    pub fallback: FallbackOptions,
}

impl DispatchSettings {
    /// Parse settings from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| DispatchError::Config(format!("Invalid dispatcher settings: {}", e)))
    }

    /// Read and parse settings from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            DispatchError::Config(format!("Cannot read settings {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Serialize settings to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| DispatchError::Config(format!("Cannot serialize settings: {}", e)))
    }

    /// Turn the settings into an initialization config.
    pub fn into_config(self) -> DispatcherConfig {
        DispatcherConfig {
            select_provider: self
                .selection
                .map(|selector| Arc::new(selector) as Arc<dyn SelectionPolicy>),
            providers: self.providers,
            fallback: self.fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn image(size: u64) -> FileDescriptor {
        FileDescriptor::new("cat.JPG").with_mime("image/jpeg").with_size(size)
    }

    #[test]
    fn test_rule_conditions() {
        let rule = SelectionRule {
            mime_prefix: Some("image/".to_string()),
            ext: Some("jpg".to_string()),
            max_size: Some(1024),
            ..SelectionRule::to("images")
        };

        assert!(rule.matches(&image(10)));
        assert!(!rule.matches(&image(4096)));
        assert!(!rule.matches(&FileDescriptor::new("cat.jpg").with_mime("image/jpeg")));
        assert!(!rule.matches(&FileDescriptor::new("doc.pdf").with_mime("image/jpeg").with_size(1)));
    }

    #[test]
    fn test_mime_prefix_ignores_case() {
        let rule = SelectionRule {
            mime_prefix: Some("image/".to_string()),
            ..SelectionRule::to("images")
        };

        assert!(rule.matches(&FileDescriptor::new("a.png").with_mime("IMAGE/PNG")));
        assert!(rule.matches(&FileDescriptor::new("a.png").with_mime("Image/png")));
        assert!(!rule.matches(&FileDescriptor::new("a").with_mime("img")));
        assert!(!rule.matches(&FileDescriptor::new("a").with_mime("imagé")));
        assert!(!rule.matches(&FileDescriptor::new("a.png")));
    }

    #[test]
    fn test_rule_selector_order_and_default() {
        let selector = RuleSelector {
            rules: vec![
                SelectionRule {
                    min_size: Some(1_000_000),
                    ..SelectionRule::to("bulk")
                },
                SelectionRule {
                    mime_prefix: Some("image/".to_string()),
                    ..SelectionRule::to("images")
                },
            ],
            default: Some("files".to_string()),
        };

        assert_eq!(selector.select_provider(&image(2_000_000)).unwrap(), "bulk");
        assert_eq!(selector.select_provider(&image(10)).unwrap(), "images");
        assert_eq!(
            selector.select_provider(&FileDescriptor::new("notes.txt")).unwrap(),
            "files"
        );
    }

    #[test]
    fn test_rule_selector_without_default_fails() {
        let selector = RuleSelector {
            rules: vec![SelectionRule {
                ext: Some(".png".to_string()),
                ..SelectionRule::to("images")
            }],
            default: None,
        };

        let err = selector
            .select_provider(&FileDescriptor::new("notes.txt"))
            .unwrap_err();
        assert!(err.to_string().contains("notes.txt"));
    }

    #[test]
    fn test_builder() {
        let config = DispatcherConfig::new()
            .with_select_fn(|_| Ok("a".to_string()))
            .with_provider("a", ProviderConfig::new("memory", Value::Null))
            .with_provider("b", ProviderConfig::new("memory", json!({"streaming": true})))
            .with_fallback(FallbackOptions::capped(64));

        let providers = config.providers.as_ref().unwrap();
        assert_eq!(providers.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(config.fallback.max_buffer_bytes, Some(64));

        let policy = config.select_provider.unwrap();
        assert_eq!(policy.select_provider(&FileDescriptor::new("x")).unwrap(), "a");
    }

    #[test]
    fn test_settings_from_json() {
        let settings = DispatchSettings::from_json(
            r#"{
                "selection": { "rules": [{ "mime_prefix": "image/", "provider": "images" }], "default": "files" },
                "providers": {
                    "images": { "provider": "memory", "provider_options": { "streaming": true } },
                    "files": { "provider": "memory" }
                }
            }"#,
        )
        .unwrap();

        let providers = settings.providers.as_ref().unwrap();
        assert_eq!(providers["files"].provider_options, Value::Null);
        assert_eq!(settings.fallback.max_buffer_bytes, None);

        let config = settings.into_config();
        let policy = config.select_provider.unwrap();
        assert_eq!(policy.select_provider(&image(1)).unwrap(), "images");
    }

    #[test]
    fn test_settings_missing_sections_parse() {
        let settings = DispatchSettings::from_json("{}").unwrap();
        let config = settings.into_config();

        assert!(config.select_provider.is_none());
        assert!(config.providers.is_none());
    }

    #[test]
    fn test_settings_invalid_json() {
        let err = DispatchSettings::from_json("{ providers: ").unwrap_err();
        assert!(matches!(err, DispatchError::Config(_)));
    }

    #[test]
    fn test_settings_from_path() {
        let settings = DispatchSettings {
            selection: Some(RuleSelector {
                rules: Vec::new(),
                default: Some("a".to_string()),
            }),
            providers: Some(BTreeMap::from([(
                "a".to_string(),
                ProviderConfig::new("memory", json!({"private": true})),
            )])),
            fallback: FallbackOptions::capped(1024),
        };

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(settings.to_json().unwrap().as_bytes()).unwrap();

        let loaded = DispatchSettings::from_path(file.path()).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_settings_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = DispatchSettings::from_path(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, DispatchError::Config(_)));
    }
}
