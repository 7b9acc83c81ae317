//! Error type shared by the registry, the binder and the service.

/// Errors raised while registering, resolving or serving JSON-LD contexts.
#[derive(Debug, thiserror::Error)]
pub enum ContextLinkError {
    /// A response was bound to a key that was never registered.
    #[error("No context registered under key: {0}")]
    UnknownKey(String),

    /// Registration keys must be non-empty.
    #[error("Context registration key must not be empty")]
    EmptyKey,

    /// A context document could not be serialized.
    #[error("Context serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The scheme/host derived from the request did not form a valid URL.
    #[error("Invalid base URL {base}: {reason}")]
    InvalidBaseUrl {
        /// The base URL as derived from the request.
        base: String,
        /// Parser message.
        reason: String,
    },

    /// A `Link` header value contained bytes not allowed in HTTP headers.
    #[error("Invalid Link header value: {0}")]
    InvalidHeader(String),

    /// A handler asked for a binder on a route not wrapped by the interceptor.
    #[error("ContextBinder missing from request extensions; is the JSON-LD context middleware installed?")]
    BinderMissing,

    /// Reading a contexts file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be interpreted.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ContextLinkError {
    /// Machine-readable error code used in JSON error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownKey(_) => "UNKNOWN_CONTEXT_KEY",
            Self::EmptyKey => "EMPTY_CONTEXT_KEY",
            Self::Serialization(_) => "CONTEXT_SERIALIZATION_FAILED",
            Self::InvalidBaseUrl { .. } => "INVALID_BASE_URL",
            Self::InvalidHeader(_) => "INVALID_LINK_HEADER",
            Self::BinderMissing => "CONTEXT_BINDER_MISSING",
            Self::Io(_) => "IO_ERROR",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
        }
    }
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, ContextLinkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_key_message_names_key() {
        let err = ContextLinkError::UnknownKey("schema".to_string());
        assert_eq!(err.to_string(), "No context registered under key: schema");
        assert_eq!(err.code(), "UNKNOWN_CONTEXT_KEY");
    }

    #[test]
    fn test_serde_error_converts() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ContextLinkError = serde_err.into();
        assert!(matches!(err, ContextLinkError::Serialization(_)));
    }
}
