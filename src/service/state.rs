//! Shared interceptor state.

use std::sync::Arc;

use axum::Router;
use serde_json::Value;

use crate::config::ContextLinkConfig;
use crate::error::Result;
use crate::registry::ContextRegistry;

use super::middleware::jsonld_context_middleware;

/// JSON-LD context interceptor: a registry plus the request handling
/// options that go with it.
///
/// Cloning shares the registry.
#[derive(Debug, Clone)]
pub struct JsonLdContextLink {
    registry: Arc<ContextRegistry>,
    trust_forwarded_headers: bool,
}

impl JsonLdContextLink {
    /// Create an interceptor with a fresh registry.
    pub fn new(config: ContextLinkConfig) -> Self {
        Self {
            registry: Arc::new(ContextRegistry::from_config(&config)),
            trust_forwarded_headers: config.trust_forwarded_headers,
        }
    }

    /// Create an interceptor around an existing registry.
    pub fn with_registry(registry: Arc<ContextRegistry>, trust_forwarded_headers: bool) -> Self {
        Self {
            registry,
            trust_forwarded_headers,
        }
    }

    /// Load configuration from the environment.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(ContextLinkConfig::from_env()?))
    }

    /// The shared registry.
    pub fn registry(&self) -> &Arc<ContextRegistry> {
        &self.registry
    }

    /// Whether forwarded headers are honored when building link targets.
    pub fn trust_forwarded_headers(&self) -> bool {
        self.trust_forwarded_headers
    }

    /// Register a context ahead of any request. See
    /// [`ContextRegistry::set_context`].
    pub fn set_context(&self, context: Value, key: &str) -> Result<String> {
        self.registry.set_context(context, key)
    }

    /// Wrap every route of `router` (fallback included) in the interceptor.
    pub fn apply<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.layer(axum::middleware::from_fn_with_state(
            self.clone(),
            jsonld_context_middleware,
        ))
    }
}

impl Default for JsonLdContextLink {
    fn default() -> Self {
        Self::new(ContextLinkConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_base_path() {
        let link = JsonLdContextLink::default();
        assert_eq!(link.registry().base_path(), "/");
        assert!(link.trust_forwarded_headers());
    }

    #[test]
    fn test_base_path_from_config() {
        let link = JsonLdContextLink::new(ContextLinkConfig::default().with_base_path("/example/"));
        assert_eq!(link.registry().base_path(), "/example/");
    }

    #[test]
    fn test_clones_share_registry() {
        let link = JsonLdContextLink::default();
        let clone = link.clone();

        clone.set_context(json!({"@vocab": "http://schema.org/"}), "schema").unwrap();

        assert_eq!(link.registry().path_for_key("schema").as_deref(), Some("/schema"));
    }
}
