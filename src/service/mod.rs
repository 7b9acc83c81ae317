//! axum integration.
//!
//! - [`JsonLdContextLink`] owns the shared registry and installs the
//!   interceptor on a router
//! - [`jsonld_context_middleware`] serves context documents and writes
//!   `Link` headers
//! - [`ContextBinder`](crate::ContextBinder) is an extractor for handlers
//!
//! ## Standalone Endpoints
//!
//! - `GET /health` - Registry statistics
//! - `GET /health/live` - Liveness check
//! - any registered context path - The context document

pub mod middleware;
pub mod routes;
pub mod state;

pub use middleware::{context_response, jsonld_context_middleware};
pub use routes::{create_router, ErrorResponse, HealthResponse};
pub use state::JsonLdContextLink;
