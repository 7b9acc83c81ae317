//! `Link` header formatting and aggregation (RFC 8288).
//!
//! Entries render as `<target>; rel="relation"; name="value"`. Appending to a
//! response merges every existing `Link` value and the new entries into one
//! comma-separated header, so links set earlier by handlers are kept.

use std::fmt;

use http::header::{HeaderMap, HeaderValue, LINK};

use crate::error::{ContextLinkError, Result};

/// Link relation identifying a JSON-LD context document.
pub const JSONLD_CONTEXT_REL: &str = "http://www.w3.org/ns/json-ld#context";

/// Media type of JSON-LD documents.
pub const JSONLD_MEDIA_TYPE: &str = "application/ld+json";

/// A single typed link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Absolute target IRI.
    pub target: String,
    /// Relation type.
    pub rel: String,
    /// Extra target attributes, rendered in order after `rel`.
    pub params: Vec<(String, String)>,
}

impl Link {
    /// Create a link with no extra attributes.
    pub fn new(target: impl Into<String>, rel: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            rel: rel.into(),
            params: Vec::new(),
        }
    }

    /// Add a target attribute.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// The JSON-LD context link for `target`.
    pub fn jsonld_context(target: impl Into<String>) -> Self {
        Self::new(target, JSONLD_CONTEXT_REL).with_param("type", JSONLD_MEDIA_TYPE)
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>; rel=\"{}\"", self.target, quote(&self.rel))?;
        for (name, value) in &self.params {
            write!(f, "; {}=\"{}\"", name, quote(value))?;
        }
        Ok(())
    }
}

fn quote(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Append `links` to the `Link` header in `headers`.
///
/// Existing values (one or many header lines) are merged with the new
/// entries into a single header line. Existing values are copied as raw
/// bytes, so opaque (non-UTF-8) values set by handlers survive the merge.
pub fn append_links(headers: &mut HeaderMap, links: &[Link]) -> Result<()> {
    if links.is_empty() {
        return Ok(());
    }

    let mut entries: Vec<Vec<u8>> = headers
        .get_all(LINK)
        .iter()
        .map(|v| trim_ows(v.as_bytes()))
        .filter(|v| !v.is_empty())
        .map(<[u8]>::to_vec)
        .collect();
    entries.extend(links.iter().map(|link| link.to_string().into_bytes()));

    let joined = entries.join(&b", "[..]);
    let value = HeaderValue::from_bytes(&joined).map_err(|e| {
        ContextLinkError::InvalidHeader(format!("{}: {}", e, String::from_utf8_lossy(&joined)))
    })?;
    headers.insert(LINK, value);
    Ok(())
}

/// Strip optional whitespace (SP / HTAB) from both ends.
fn trim_ows(mut bytes: &[u8]) -> &[u8] {
    while let [b' ' | b'\t', rest @ ..] = bytes {
        bytes = rest;
    }
    while let [rest @ .., b' ' | b'\t'] = bytes {
        bytes = rest;
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jsonld_context_format() {
        let link = Link::jsonld_context("http://example.org/schema");
        assert_eq!(
            link.to_string(),
            "<http://example.org/schema>; rel=\"http://www.w3.org/ns/json-ld#context\"; type=\"application/ld+json\""
        );
    }

    #[test]
    fn test_param_values_are_escaped() {
        let link = Link::new("http://a/", "alternate").with_param("title", "say \"hi\"");
        assert_eq!(link.to_string(), r#"<http://a/>; rel="alternate"; title="say \"hi\"""#);
    }

    #[test]
    fn test_append_to_empty_headers() {
        let mut headers = HeaderMap::new();
        append_links(&mut headers, &[Link::jsonld_context("http://h/schema")]).unwrap();

        assert_eq!(headers.get_all(LINK).iter().count(), 1);
        assert!(headers[LINK].to_str().unwrap().starts_with("<http://h/schema>"));
    }

    #[test]
    fn test_append_keeps_existing_links() {
        let mut headers = HeaderMap::new();
        headers.append(LINK, HeaderValue::from_static("<http://h/a>; rel=\"next\""));
        headers.append(LINK, HeaderValue::from_static("<http://h/b>; rel=\"prev\""));

        append_links(&mut headers, &[Link::jsonld_context("http://h/schema")]).unwrap();

        let value = headers[LINK].to_str().unwrap();
        assert_eq!(headers.get_all(LINK).iter().count(), 1);
        assert!(value.starts_with("<http://h/a>; rel=\"next\", <http://h/b>; rel=\"prev\", <http://h/schema>"));
    }

    #[test]
    fn test_append_keeps_opaque_existing_value() {
        let mut headers = HeaderMap::new();
        let latin1 = HeaderValue::from_bytes(b"<http://h/caf\xe9>; rel=\"alternate\"").unwrap();
        assert!(latin1.to_str().is_err());
        headers.insert(LINK, latin1);

        append_links(&mut headers, &[Link::jsonld_context("http://h/schema")]).unwrap();

        let value = headers[LINK].as_bytes();
        assert_eq!(headers.get_all(LINK).iter().count(), 1);
        assert!(value.starts_with(b"<http://h/caf\xe9>; rel=\"alternate\", <http://h/schema>"));
    }

    #[test]
    fn test_append_nothing_leaves_headers_untouched() {
        let mut headers = HeaderMap::new();
        append_links(&mut headers, &[]).unwrap();
        assert!(headers.get(LINK).is_none());
    }

    #[test]
    fn test_control_characters_are_rejected() {
        let mut headers = HeaderMap::new();
        let result = append_links(&mut headers, &[Link::new("http://h/\n", "self")]);
        assert!(matches!(result, Err(ContextLinkError::InvalidHeader(_))));
    }
}
