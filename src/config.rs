//! Construction-time configuration for the context registry and interceptor.

use serde::{Deserialize, Serialize};

use crate::error::{ContextLinkError, Result};

/// Environment variable overriding [`ContextLinkConfig::base_path`].
pub const BASE_PATH_ENV: &str = "JSONLD_CONTEXT_BASE_PATH";

/// Environment variable overriding [`ContextLinkConfig::trust_forwarded_headers`].
pub const TRUST_FORWARDED_ENV: &str = "JSONLD_TRUST_FORWARDED";

/// Configuration for a [`ContextRegistry`](crate::ContextRegistry) and the
/// middleware serving it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextLinkConfig {
    /// Root path that registration keys are resolved against.
    pub base_path: String,
    /// Honor `Forwarded` / `X-Forwarded-*` headers when building absolute
    /// link targets.
    pub trust_forwarded_headers: bool,
}

impl Default for ContextLinkConfig {
    fn default() -> Self {
        Self {
            base_path: "/".to_string(),
            trust_forwarded_headers: true,
        }
    }
}

impl ContextLinkConfig {
    /// Configuration with a custom base path.
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Enable or disable proxy header handling.
    pub fn with_trust_forwarded_headers(mut self, trust: bool) -> Self {
        self.trust_forwarded_headers = trust;
        self
    }

    /// Load configuration from environment variables, falling back to defaults.
    ///
    /// Reads `JSONLD_CONTEXT_BASE_PATH` and `JSONLD_TRUST_FORWARDED`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(base_path) = lookup(BASE_PATH_ENV).filter(|s| !s.is_empty()) {
            config.base_path = base_path;
        }

        if let Some(raw) = lookup(TRUST_FORWARDED_ENV) {
            config.trust_forwarded_headers = parse_flag(&raw).ok_or_else(|| {
                ContextLinkError::InvalidConfig(format!(
                    "{} must be true/false/1/0, got {:?}",
                    TRUST_FORWARDED_ENV, raw
                ))
            })?;
        }

        Ok(config)
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_base_path_is_root() {
        let config = ContextLinkConfig::default();
        assert_eq!(config.base_path, "/");
        assert!(config.trust_forwarded_headers);
    }

    #[test]
    fn test_from_lookup_overrides() {
        let vars: HashMap<&str, &str> = [
            (BASE_PATH_ENV, "/example/"),
            (TRUST_FORWARDED_ENV, "false"),
        ]
        .into_iter()
        .collect();

        let config = ContextLinkConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.base_path, "/example/");
        assert!(!config.trust_forwarded_headers);
    }

    #[test]
    fn test_from_lookup_rejects_bad_flag() {
        let result = ContextLinkConfig::from_lookup(|k| {
            (k == TRUST_FORWARDED_ENV).then(|| "maybe".to_string())
        });
        assert!(matches!(result, Err(ContextLinkError::InvalidConfig(_))));
    }

    #[test]
    fn test_deserialize_partial_uses_defaults() {
        let config: ContextLinkConfig = serde_json::from_str(r#"{"base_path":"/ctx/"}"#).unwrap();
        assert_eq!(config.base_path, "/ctx/");
        assert!(config.trust_forwarded_headers);
    }
}
