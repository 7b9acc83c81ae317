//! Context registry.
//!
//! Maps registration keys to paths and paths to JSON-LD context documents.
//! Documents are deduplicated by structural equality: registering a document
//! equal to one already stored reuses that document's path.
//!
//! ## Guarantees
//!
//! - Every path a key points at holds a document
//! - A path is never removed and never reassigned to a different document
//! - Dedup scans run in registration order, so ties resolve to the oldest path
//! - The scan and the insert run under one write lock

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

use crate::canonical::{canonical_hash_hex, json_eq};
use crate::config::ContextLinkConfig;
use crate::error::{ContextLinkError, Result};
use crate::path;

/// Outcome of a registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// Path now bound to the key.
    pub path: String,
    /// Whether an existing document was reused.
    pub reused: bool,
}

#[derive(Debug, Default, Clone)]
struct RegistryState {
    /// path -> document, in registration order.
    contexts: IndexMap<String, Value>,
    /// key -> path.
    keys: IndexMap<String, String>,
}

impl RegistryState {
    fn find_equal(&self, context: &Value) -> Option<&String> {
        self.contexts
            .iter()
            .find(|(_, stored)| json_eq(stored, context))
            .map(|(path, _)| path)
    }

    /// First free path for `key`, versioning with `~N` when the resolved
    /// path already holds another document.
    fn free_path(&self, base_path: &str, key: &str) -> String {
        let resolved = path::resolve(base_path, key);
        if !self.contexts.contains_key(&resolved) {
            return resolved;
        }

        let mut version = 2u64;
        loop {
            let candidate = format!("{}~{}", resolved, version);
            if !self.contexts.contains_key(&candidate) {
                return candidate;
            }
            version += 1;
        }
    }
}

/// Process-wide registry of JSON-LD context documents.
///
/// Shared between requests behind an `Arc`; all methods take `&self`.
#[derive(Debug)]
pub struct ContextRegistry {
    base_path: String,
    state: RwLock<RegistryState>,
}

impl ContextRegistry {
    /// Create an empty registry rooted at `base_path`.
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            state: RwLock::new(RegistryState::default()),
        }
    }

    /// Create an empty registry from configuration.
    pub fn from_config(config: &ContextLinkConfig) -> Self {
        Self::new(config.base_path.clone())
    }

    /// Root path keys are resolved against.
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Register `context` under `key` and return the path serving it.
    ///
    /// Reuses the path of a structurally equal document if one exists;
    /// otherwise stores the document at `resolve(base_path, key)`. The key
    /// is always rebound to the returned path.
    pub fn set_context(&self, context: Value, key: &str) -> Result<String> {
        self.register(context, key).map(|r| r.path)
    }

    /// Like [`set_context`](Self::set_context), also reporting whether the
    /// document was deduplicated.
    pub fn register(&self, context: Value, key: &str) -> Result<Registration> {
        if key.is_empty() {
            return Err(ContextLinkError::EmptyKey);
        }

        let mut state = self.state.write();

        let registration = match state.find_equal(&context) {
            Some(existing) => Registration {
                path: existing.clone(),
                reused: true,
            },
            None => {
                let path = state.free_path(&self.base_path, key);
                state.contexts.insert(path.clone(), context);
                Registration { path, reused: false }
            }
        };

        let previous = state
            .keys
            .insert(key.to_string(), registration.path.clone());
        drop(state);

        debug!(
            key = %key,
            path = %registration.path,
            reused = registration.reused,
            rebound = previous.as_deref().is_some_and(|p| p != registration.path),
            "context registered"
        );

        Ok(registration)
    }

    /// Register several `(key, context)` pairs in order.
    pub fn register_all<I>(&self, entries: I) -> Result<Vec<Registration>>
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        entries
            .into_iter()
            .map(|(key, context)| self.register(context, &key))
            .collect()
    }

    /// Document stored at `path`.
    pub fn context(&self, path: &str) -> Option<Value> {
        self.state.read().contexts.get(path).cloned()
    }

    /// Whether a document is served at `path`.
    pub fn contains_path(&self, path: &str) -> bool {
        self.state.read().contexts.contains_key(path)
    }

    /// Path currently bound to `key`.
    pub fn path_for_key(&self, key: &str) -> Option<String> {
        self.state.read().keys.get(key).cloned()
    }

    /// Path and document currently bound to `key`, read atomically.
    pub fn context_for_key(&self, key: &str) -> Option<(String, Value)> {
        let state = self.state.read();
        let path = state.keys.get(key)?;
        let context = state.contexts.get(path)?;
        Some((path.clone(), context.clone()))
    }

    /// All served paths, in registration order.
    pub fn paths(&self) -> Vec<String> {
        self.state.read().contexts.keys().cloned().collect()
    }

    /// All `(key, path)` bindings, in first-registration order.
    pub fn keys(&self) -> Vec<(String, String)> {
        self.state
            .read()
            .keys
            .iter()
            .map(|(k, p)| (k.clone(), p.clone()))
            .collect()
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.state.read().contexts.len()
    }

    /// Check if no document is stored.
    pub fn is_empty(&self) -> bool {
        self.state.read().contexts.is_empty()
    }

    /// Number of registered keys.
    pub fn key_count(&self) -> usize {
        self.state.read().keys.len()
    }

    /// Registry fingerprint.
    ///
    /// Hash over the sorted paths and key bindings; changes whenever a
    /// document is added or a key is rebound.
    pub fn fingerprint(&self) -> Result<String> {
        let state = self.state.read();
        let mut paths: Vec<&str> = state.contexts.keys().map(String::as_str).collect();
        paths.sort_unstable();
        let keys: BTreeMap<&str, &str> = state
            .keys
            .iter()
            .map(|(k, p)| (k.as_str(), p.as_str()))
            .collect();
        canonical_hash_hex(&(paths, keys))
    }
}

impl Default for ContextRegistry {
    fn default() -> Self {
        Self::from_config(&ContextLinkConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;
    use std::sync::Arc;

    fn schema() -> Value {
        json!({"@vocab": "http://schema.org/"})
    }

    #[test]
    fn test_new_registry_is_empty() {
        let registry = ContextRegistry::default();
        assert_eq!(registry.base_path(), "/");
        assert!(registry.is_empty());
        assert_eq!(registry.key_count(), 0);
    }

    #[test]
    fn test_set_context_combines_base_path_and_key() {
        let registry = ContextRegistry::new("/example/");
        let path = registry.set_context(schema(), "schema").unwrap();

        assert_eq!(path, "/example/schema");
        assert_eq!(registry.paths(), vec!["/example/schema".to_string()]);
        assert_eq!(registry.context("/example/schema"), Some(schema()));
        assert_eq!(
            registry.keys(),
            vec![("schema".to_string(), "/example/schema".to_string())]
        );
    }

    #[test]
    fn test_equal_context_reuses_path_for_new_key() {
        let registry = ContextRegistry::new("/example/");

        registry.set_context(schema(), "schema").unwrap();
        registry
            .set_context(json!({"@vocab": "http://example.org/"}), "other")
            .unwrap();
        let reg = registry.register(schema(), "schema1").unwrap();

        assert!(reg.reused);
        assert_eq!(reg.path, "/example/schema");
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.keys(),
            vec![
                ("schema".to_string(), "/example/schema".to_string()),
                ("other".to_string(), "/example/other".to_string()),
                ("schema1".to_string(), "/example/schema".to_string()),
            ]
        );
    }

    #[test]
    fn test_dedup_is_structural() {
        let registry = ContextRegistry::default();
        let a: Value = serde_json::from_str(r#"{"name":"http://schema.org/name","age":1}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"age":1.0,"name":"http://schema.org/name"}"#).unwrap();

        let p1 = registry.set_context(a, "person").unwrap();
        let p2 = registry.set_context(b, "human").unwrap();

        assert_eq!(p1, p2);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_rebinding_key_keeps_old_document() {
        let registry = ContextRegistry::default();
        let first = registry.set_context(schema(), "schema").unwrap();
        let second = registry
            .set_context(json!({"@vocab": "http://example.org/"}), "schema")
            .unwrap();

        assert_eq!(first, "/schema");
        assert_eq!(second, "/schema~2");
        assert_eq!(registry.context(&first), Some(schema()));
        assert_eq!(registry.path_for_key("schema"), Some(second));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_rebinding_back_to_first_document_reuses_original_path() {
        let registry = ContextRegistry::default();
        registry.set_context(schema(), "schema").unwrap();
        registry.set_context(json!({"v": 2}), "schema").unwrap();
        let path = registry.set_context(schema(), "schema").unwrap();

        assert_eq!(path, "/schema");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_empty_key_is_rejected() {
        let registry = ContextRegistry::default();
        let result = registry.set_context(schema(), "");
        assert!(matches!(result, Err(ContextLinkError::EmptyKey)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_context_for_key() {
        let registry = ContextRegistry::new("/ctx");
        registry.set_context(schema(), "schema").unwrap();

        assert_eq!(
            registry.context_for_key("schema"),
            Some(("/ctx/schema".to_string(), schema()))
        );
        assert_eq!(registry.context_for_key("missing"), None);
    }

    #[test]
    fn test_fingerprint_changes_on_registration() {
        let registry = ContextRegistry::default();
        let empty = registry.fingerprint().unwrap();

        registry.set_context(schema(), "schema").unwrap();
        let one = registry.fingerprint().unwrap();
        assert_ne!(empty, one);

        // Same key, same document: nothing changes.
        registry.set_context(schema(), "schema").unwrap();
        assert_eq!(registry.fingerprint().unwrap(), one);

        registry.set_context(schema(), "alias").unwrap();
        assert_ne!(registry.fingerprint().unwrap(), one);
    }

    #[test]
    fn test_register_all_in_order() {
        let registry = ContextRegistry::default();
        let regs = registry
            .register_all(vec![
                ("schema".to_string(), schema()),
                ("alias".to_string(), schema()),
            ])
            .unwrap();

        assert!(!regs[0].reused);
        assert!(regs[1].reused);
        assert_eq!(regs[1].path, "/schema");
    }

    #[test]
    fn test_concurrent_registration_stores_one_document() {
        let registry = Arc::new(ContextRegistry::default());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    registry
                        .set_context(json!({"@vocab": "http://schema.org/"}), &format!("k{}", i))
                        .unwrap()
                })
            })
            .collect();

        let paths: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(registry.len(), 1);
        assert!(paths.iter().all(|p| p == &paths[0]));
        assert_eq!(registry.key_count(), 16);
    }

    proptest! {
        #[test]
        fn prop_keys_always_point_at_stored_documents(
            ops in proptest::collection::vec(("[a-d]{1,2}", 0u8..4), 1..40)
        ) {
            let registry = ContextRegistry::new("/base/");
            let mut seen: Vec<(String, Value)> = Vec::new();

            for (key, doc) in ops {
                let context = json!({"@vocab": format!("http://example.org/{}", doc)});
                let path = registry.set_context(context.clone(), &key).unwrap();

                // Path stability: a path keeps its first document forever.
                match seen.iter().find(|(p, _)| p == &path) {
                    Some((_, stored)) => prop_assert_eq!(stored, &context),
                    None => seen.push((path.clone(), context.clone())),
                }
                prop_assert_eq!(registry.path_for_key(&key), Some(path));
            }

            for (key, path) in registry.keys() {
                prop_assert!(registry.contains_path(&path), "dangling key {}", key);
            }
            // One document per distinct context.
            prop_assert!(registry.len() <= 4);
            for (path, stored) in &seen {
                let fetched = registry.context(path);
                prop_assert_eq!(fetched.as_ref(), Some(stored));
            }
        }
    }
}
