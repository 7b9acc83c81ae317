//! Reverse-proxy-aware absolute URL derivation.
//!
//! The scheme and host of a request are taken from, in order:
//!
//! | Part   | Sources |
//! |--------|---------|
//! | scheme | `Forwarded: proto=`, `X-Forwarded-Proto`, request URI scheme, `http` |
//! | host   | `Forwarded: host=`, `X-Forwarded-Host`, `Host`, request URI authority, `localhost` |
//!
//! Forwarded headers are only consulted when the caller trusts them. When a
//! proxy chain appends several comma-separated values, the first one (the
//! client-facing hop) wins.

use http::header::{HeaderMap, FORWARDED, HOST};
use http::Uri;
use url::Url;

use crate::error::{ContextLinkError, Result};

const X_FORWARDED_PROTO: &str = "x-forwarded-proto";
const X_FORWARDED_HOST: &str = "x-forwarded-host";

/// Scheme and host a client used to reach this server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOrigin {
    /// URL scheme, e.g. `https`.
    pub scheme: String,
    /// Host with optional port, e.g. `example.org:8443`.
    pub host: String,
}

impl RequestOrigin {
    /// Create an origin from explicit parts.
    pub fn new(scheme: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
        }
    }

    /// Derive the origin of a request from its URI and headers.
    pub fn from_request(uri: &Uri, headers: &HeaderMap, trust_forwarded: bool) -> Self {
        let forwarded = if trust_forwarded {
            forwarded_pairs(headers)
        } else {
            Vec::new()
        };

        let forwarded_value = |name: &str| {
            forwarded
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.clone())
        };

        let scheme = forwarded_value("proto")
            .or_else(|| trust_forwarded.then(|| first_value(headers, X_FORWARDED_PROTO)).flatten())
            .or_else(|| uri.scheme_str().map(str::to_string))
            .unwrap_or_else(|| "http".to_string())
            .to_ascii_lowercase();

        let host = forwarded_value("host")
            .or_else(|| trust_forwarded.then(|| first_value(headers, X_FORWARDED_HOST)).flatten())
            .or_else(|| first_value(headers, HOST.as_str()))
            .or_else(|| uri.authority().map(|a| a.as_str().to_string()))
            .unwrap_or_else(|| "localhost".to_string());

        Self { scheme, host }
    }

    /// `scheme://host` form of this origin.
    pub fn base(&self) -> String {
        format!("{}://{}", self.scheme, self.host)
    }

    /// Absolute URL for `path` on this origin, with no query or fragment.
    pub fn url_for_path(&self, path: &str) -> Result<Url> {
        let base = self.base();
        let mut url = Url::parse(&base).map_err(|e| ContextLinkError::InvalidBaseUrl {
            base: base.clone(),
            reason: e.to_string(),
        })?;

        if url.cannot_be_a_base() {
            return Err(ContextLinkError::InvalidBaseUrl {
                base,
                reason: "URL cannot carry a path".to_string(),
            });
        }

        url.set_path(path);
        url.set_query(None);
        url.set_fragment(None);
        Ok(url)
    }
}

/// First comma-separated value of a header, trimmed.
fn first_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// `name=value` pairs of the first element of the RFC 7239 `Forwarded` header.
fn forwarded_pairs(headers: &HeaderMap) -> Vec<(String, String)> {
    let Some(element) = first_value(headers, FORWARDED.as_str()) else {
        return Vec::new();
    };

    element
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let value = value.trim().trim_matches('"');
            (!value.is_empty()).then(|| (name.trim().to_string(), value.to_string()))
        })
        .collect()
}
