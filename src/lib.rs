//! # jsonld-context-link
//!
//! Publish JSON-LD context documents at stable paths and point responses at
//! them with a `Link` header instead of embedding `@context` inline.
//!
//! ## Core Contract
//!
//! 1. Register a context under a key; structurally equal documents share one path
//! 2. Requests for a registered path receive the document as `application/ld+json`
//! 3. Handlers bind their response to a context (by value or by key) and the
//!    response gains
//!    `Link: <abs-url>; rel="http://www.w3.org/ns/json-ld#context"; type="application/ld+json"`
//!
//! ## Architecture
//!
//! ```text
//! Request → jsonld_context_middleware ─┬─ registered path? → 200 application/ld+json
//!                 ↓                    └─ else: ContextBinder → handler → Link header
//!          ContextRegistry (Arc, RwLock)
//! ```
//!
//! ## Example
//!
//! ```no_run
//! # #[cfg(feature = "middleware")]
//! # fn demo() -> Result<(), jsonld_context_link::ContextLinkError> {
//! use axum::{routing::get, Router};
//! use jsonld_context_link::{ContextBinder, ContextLinkConfig, JsonLdContextLink};
//! use serde_json::json;
//!
//! let link = JsonLdContextLink::new(ContextLinkConfig::default().with_base_path("/contexts/"));
//! link.set_context(json!({"@vocab": "http://schema.org/"}), "schema")?;
//!
//! let app: Router = link.apply(Router::new().route(
//!     "/person",
//!     get(|binder: ContextBinder| async move {
//!         binder.bind_by_key("schema")?;
//!         Ok::<_, jsonld_context_link::ContextLinkError>(r#"{"name":"Alice"}"#)
//!     }),
//! ));
//! # let _ = app;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod absolute_url;
pub mod binder;
pub mod canonical;
pub mod config;
pub mod error;
pub mod link;
pub mod path;
pub mod registry;

#[cfg(feature = "middleware")]
pub mod service;

// Re-exports
pub use absolute_url::RequestOrigin;
pub use binder::{BoundContext, ContextBinder, ContextRef};
pub use canonical::{canonical_hash_hex, json_eq};
pub use config::ContextLinkConfig;
pub use error::{ContextLinkError, Result};
pub use link::{append_links, Link, JSONLD_CONTEXT_REL, JSONLD_MEDIA_TYPE};
pub use registry::{ContextRegistry, Registration};

// Service re-exports (when the middleware feature is enabled)
#[cfg(feature = "middleware")]
pub use service::{create_router, jsonld_context_middleware, JsonLdContextLink};
