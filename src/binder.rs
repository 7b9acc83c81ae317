//! Per-response context binding.
//!
//! A [`ContextBinder`] is created for every request that is not itself a
//! context request. Handlers use it to declare which JSON-LD context their
//! response body conforms to, either by value ([`ContextBinder::bind_by_context`])
//! or by a key registered earlier ([`ContextBinder::bind_by_key`]). Each
//! binding records one absolute `Link` entry; the interceptor writes all of
//! them onto the response once the handler returns.

use std::sync::Arc;

use http::HeaderMap;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::warn;

use crate::absolute_url::RequestOrigin;
use crate::error::{ContextLinkError, Result};
use crate::link::{append_links, Link};
use crate::registry::ContextRegistry;

/// What a response is bound to.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextRef {
    /// A context document, registered (or deduplicated) under `key`.
    Inline {
        /// Context document.
        context: Value,
        /// Registration key.
        key: String,
    },
    /// A key registered earlier.
    Key(String),
}

impl ContextRef {
    /// Bind by value.
    pub fn inline(context: Value, key: impl Into<String>) -> Self {
        Self::Inline {
            context,
            key: key.into(),
        }
    }

    /// Bind by key only.
    pub fn key(key: impl Into<String>) -> Self {
        Self::Key(key.into())
    }
}

/// The context a response was bound to.
///
/// Inserted into the response extensions by the interceptor.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundContext(pub Value);

#[derive(Debug, Default)]
struct BindingState {
    links: Vec<Link>,
    current: Option<Value>,
}

/// Handle for binding the current response to a JSON-LD context.
///
/// Cheap to clone; clones share the same response state.
#[derive(Debug, Clone)]
pub struct ContextBinder {
    registry: Arc<ContextRegistry>,
    origin: RequestOrigin,
    state: Arc<Mutex<BindingState>>,
}

impl ContextBinder {
    /// Create a binder for a request arriving at `origin`.
    pub fn new(registry: Arc<ContextRegistry>, origin: RequestOrigin) -> Self {
        Self {
            registry,
            origin,
            state: Arc::new(Mutex::new(BindingState::default())),
        }
    }

    /// Register `context` under `key` (or reuse an equal document) and
    /// link the response to it. Returns the context path.
    pub fn bind_by_context(&self, context: Value, key: &str) -> Result<String> {
        let path = self.registry.set_context(context.clone(), key)?;
        self.attach(&path, context)?;
        Ok(path)
    }

    /// Link the response to the context already registered under `key`.
    ///
    /// Fails with [`ContextLinkError::UnknownKey`] if `key` was never
    /// registered.
    pub fn bind_by_key(&self, key: &str) -> Result<String> {
        let (path, context) = self.registry.context_for_key(key).ok_or_else(|| {
            warn!(key = %key, "binding to unregistered context key");
            ContextLinkError::UnknownKey(key.to_string())
        })?;
        self.attach(&path, context)?;
        Ok(path)
    }

    /// Dispatch to [`bind_by_context`](Self::bind_by_context) or
    /// [`bind_by_key`](Self::bind_by_key).
    pub fn bind(&self, context_ref: ContextRef) -> Result<String> {
        match context_ref {
            ContextRef::Inline { context, key } => self.bind_by_context(context, &key),
            ContextRef::Key(key) => self.bind_by_key(&key),
        }
    }

    fn attach(&self, path: &str, context: Value) -> Result<()> {
        let url = self.origin.url_for_path(path)?;
        let mut state = self.state.lock();
        state.links.push(Link::jsonld_context(url.as_str()));
        state.current = Some(context);
        Ok(())
    }

    /// Context of the most recent binding.
    pub fn current_context(&self) -> Option<Value> {
        self.state.lock().current.clone()
    }

    /// Links recorded so far.
    pub fn links(&self) -> Vec<Link> {
        self.state.lock().links.clone()
    }

    /// Origin link targets are built on.
    pub fn origin(&self) -> &RequestOrigin {
        &self.origin
    }

    /// Registry this binder registers into.
    pub fn registry(&self) -> &Arc<ContextRegistry> {
        &self.registry
    }

    /// Append the recorded links to `headers`.
    pub fn write_links(&self, headers: &mut HeaderMap) -> Result<()> {
        let state = self.state.lock();
        append_links(headers, &state.links)
    }

    /// The bound context, if any binding happened.
    pub fn bound_context(&self) -> Option<BoundContext> {
        self.current_context().map(BoundContext)
    }
}
