//! Request interceptor.
//!
//! - Requests for a registered context path are answered directly with the
//!   stored document as `application/ld+json`.
//! - Every other request gets a [`ContextBinder`] in its extensions. After
//!   the inner service responds, the binder's links are appended to the
//!   `Link` header and the bound context is stored as a [`BoundContext`]
//!   response extension.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::CONTENT_TYPE, request::Parts, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use percent_encoding::percent_decode_str;
use serde_json::Value;
use std::borrow::Cow;
use tracing::{debug, error};

use crate::absolute_url::RequestOrigin;
use crate::binder::ContextBinder;
use crate::error::{ContextLinkError, Result};
use crate::link::JSONLD_MEDIA_TYPE;
use crate::registry::ContextRegistry;

use super::state::JsonLdContextLink;

/// Interceptor entry point, installed with
/// `axum::middleware::from_fn_with_state` (see [`JsonLdContextLink::apply`]).
pub async fn jsonld_context_middleware(
    State(link): State<JsonLdContextLink>,
    mut request: Request,
    next: Next,
) -> Response {
    // Uri::path never includes the query string or fragment.
    let path = request.uri().path();

    if let Some(context) = lookup_context(link.registry(), path) {
        debug!(path = %path, "serving JSON-LD context");
        return match context_response(&context) {
            Ok(response) => response,
            Err(e) => e.into_response(),
        };
    }

    let origin = RequestOrigin::from_request(
        request.uri(),
        request.headers(),
        link.trust_forwarded_headers(),
    );
    let binder = ContextBinder::new(link.registry().clone(), origin);
    request.extensions_mut().insert(binder.clone());

    let mut response = next.run(request).await;

    if let Err(e) = binder.write_links(response.headers_mut()) {
        error!(error = %e, "failed to write JSON-LD context link");
        return e.into_response();
    }
    if let Some(bound) = binder.bound_context() {
        response.extensions_mut().insert(bound);
    }

    response
}

/// Document served at the raw request `path`.
///
/// Registry paths are stored decoded while link targets go out
/// percent-encoded, so the decoded form is tried first and the raw form
/// covers keys that themselves contain `%XX` sequences.
fn lookup_context(registry: &ContextRegistry, path: &str) -> Option<Value> {
    let decoded = percent_decode_str(path).decode_utf8().ok();
    decoded
        .as_deref()
        .and_then(|p| registry.context(p))
        .or_else(|| match decoded {
            Some(Cow::Borrowed(_)) => None,
            _ => registry.context(path),
        })
}

/// `200 application/ld+json` response carrying `context`.
pub fn context_response(context: &Value) -> Result<Response> {
    let body = serde_json::to_vec(context)?;
    Ok((
        StatusCode::OK,
        [(CONTENT_TYPE, HeaderValue::from_static(JSONLD_MEDIA_TYPE))],
        body,
    )
        .into_response())
}

#[async_trait]
impl<S> FromRequestParts<S> for ContextBinder
where
    S: Send + Sync,
{
    type Rejection = ContextLinkError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ContextBinder>()
            .cloned()
            .ok_or(ContextLinkError::BinderMissing)
    }
}
