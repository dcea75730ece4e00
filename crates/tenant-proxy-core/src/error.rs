//! Error types for the tenant rewriting core

/// Result type alias using the core's [`RewriteError`]
pub type Result<T> = std::result::Result<T, RewriteError>;

/// All failure modes the classification and rewriting engine can produce.
///
/// Every variant is surfaced to the boundary adapter as-is; the core never
/// retries or recovers from its own errors. The boundary adapter maps every
/// variant to HTTP 400 and uses [`RewriteError::code`] as the stable
/// `error` field of the JSON response body.
#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    /// Unknown endpoint, unsupported method, or an index segment that is
    /// empty or contains a comma.
    #[error("classification error: {0}")]
    Classification(String),

    /// The tenant regex did not match a non-passthrough path.
    #[error("tenant extraction error: {0}")]
    TenantExtraction(String),

    /// The request addresses a configured deny-pattern physical index directly.
    #[error("access to physical index denied: {0}")]
    DenyListed(String),

    /// The body is not valid JSON/NDJSON, or a body was required but absent.
    #[error("body parse error: {0}")]
    BodyParse(String),

    /// The parsed body has the wrong shape for the action being performed.
    #[error("body shape error: {0}")]
    BodyShape(String),

    /// A template rendered to an empty string.
    #[error("template error: {0}")]
    Template(String),

    /// A physical index name does not match the tenant regex.
    #[error("index name error: {0}")]
    IndexName(String),

    /// A config value was invalid at startup.
    #[error("configuration error: {0}")]
    Config(String),
}

impl RewriteError {
    /// Stable machine-readable error code, independent of the message text.
    pub fn code(&self) -> &'static str {
        match self {
            RewriteError::Classification(_) => "unsupported_request",
            RewriteError::TenantExtraction(_) => "tenant_not_resolved",
            RewriteError::DenyListed(_) => "index_access_denied",
            RewriteError::BodyParse(_) => "body_parse_error",
            RewriteError::BodyShape(_) => "body_shape_error",
            RewriteError::Template(_) => "template_error",
            RewriteError::IndexName(_) => "index_name_error",
            RewriteError::Config(_) => "configuration_error",
        }
    }

    pub(crate) fn classification(msg: impl Into<String>) -> Self {
        Self::Classification(msg.into())
    }

    pub(crate) fn body_parse(msg: impl Into<String>) -> Self {
        Self::BodyParse(msg.into())
    }

    pub(crate) fn body_shape(msg: impl Into<String>) -> Self {
        Self::BodyShape(msg.into())
    }

    pub(crate) fn template(msg: impl Into<String>) -> Self {
        Self::Template(msg.into())
    }

    pub(crate) fn index_name(msg: impl Into<String>) -> Self {
        Self::IndexName(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_is_stable_and_independent_of_message() {
        let a = RewriteError::Classification("multiple indices".to_string());
        let b = RewriteError::Classification("unknown endpoint".to_string());
        assert_eq!(a.code(), b.code());
        assert_eq!(a.code(), "unsupported_request");
    }
}
