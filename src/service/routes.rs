//! Axum routes for the context service.

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};

use crate::error::ContextLinkError;

use super::state::JsonLdContextLink;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Service health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `healthy` when the handler answers.
    pub status: String,
    /// Crate version of the running service.
    pub version: String,
    /// Root under which context paths are synthesized.
    pub base_path: String,
    /// Number of distinct documents being served.
    pub context_count: usize,
    /// Number of key bindings.
    pub key_count: usize,
    /// Hex fingerprint of the registry's paths and key bindings.
    pub registry_fingerprint: String,
}

/// Simple liveness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessResponse {
    /// Always `alive`.
    pub status: String,
}

/// Structured error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
    /// Machine-readable error code.
    pub code: String,
    /// Additional error details (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    /// Create a new error response with code and message.
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            details: None,
        }
    }

    /// Add details to the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl IntoResponse for ContextLinkError {
    fn into_response(self) -> axum::response::Response {
        // Every variant reaching a response is a server-side usage or
        // serialization fault.
        tracing::warn!(
            code = %self.code(),
            error = %self,
            "JSON-LD context error"
        );

        let mut body = ErrorResponse::new(self.code(), self.to_string());
        if let ContextLinkError::UnknownKey(key) = &self {
            body = body.with_details(key.clone());
        }
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Health check endpoint with registry statistics.
async fn health_handler(
    State(link): State<JsonLdContextLink>,
) -> Result<Json<HealthResponse>, ContextLinkError> {
    let registry = link.registry();
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        base_path: registry.base_path().to_string(),
        context_count: registry.len(),
        key_count: registry.key_count(),
        registry_fingerprint: registry.fingerprint()?,
    }))
}

/// Liveness endpoint.
async fn liveness_handler() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "alive".to_string(),
    })
}

// ============================================================================
// Router Construction
// ============================================================================

/// Create the router for the standalone context service.
///
/// Registered context paths are answered by the interceptor; the router
/// itself only carries the health endpoints.
pub fn create_router(link: JsonLdContextLink) -> Router {
    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/health/live", get(liveness_handler))
        .with_state(link.clone());

    link.apply(router)
}
