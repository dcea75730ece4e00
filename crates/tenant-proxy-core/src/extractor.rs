//! Tenant Extractor
//!
//! Converts a raw URL path into `(tenant, rewritten_path)` using the
//! configured named-capture regex, or reports that it did not match.

use regex::Regex;

/// Outcome of applying the tenant regex to a raw path.
pub struct Extraction {
    pub tenant: String,
    /// `prefix + postfix`, normalised so an empty result becomes `"/"`.
    pub rewritten_path: String,
}

/// Apply `tenant_regex` to `raw_path`. Returns `None` if the regex does not
/// match, or if it matches but the `tenant` group is empty — the spec treats
/// an empty tenant capture as a non-match, leaving it to the caller to decide
/// whether that is an error or a passthrough.
pub fn extract_tenant(tenant_regex: &Regex, raw_path: &str) -> Option<Extraction> {
    let captures = tenant_regex.captures(raw_path)?;

    let prefix = captures.name("prefix").map(|m| m.as_str()).unwrap_or("");
    let tenant = captures.name("tenant").map(|m| m.as_str()).unwrap_or("");
    let postfix = captures.name("postfix").map(|m| m.as_str()).unwrap_or("");

    if tenant.is_empty() {
        return None;
    }

    let rewritten = format!("{}{}", prefix, postfix);
    let rewritten_path = if rewritten.is_empty() {
        "/".to_string()
    } else {
        rewritten
    };

    Some(Extraction {
        tenant: tenant.to_string(),
        rewritten_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regex() -> Regex {
        Regex::new("^(?P<prefix>/[^-]+)-(?P<tenant>[^/]+)(?P<postfix>.*)$").unwrap()
    }

    #[test]
    fn splits_prefix_tenant_postfix() {
        let e = extract_tenant(&regex(), "/products-tenant1/_search").unwrap();
        assert_eq!(e.tenant, "tenant1");
        assert_eq!(e.rewritten_path, "/products/_search");
    }

    #[test]
    fn empty_postfix_and_prefix_normalises_to_root() {
        let re = Regex::new("^(?P<prefix>)(?P<tenant>.+)(?P<postfix>)$").unwrap();
        let e = extract_tenant(&re, "tenant1").unwrap();
        assert_eq!(e.rewritten_path, "/");
    }

    #[test]
    fn empty_tenant_is_rejected() {
        let re = Regex::new("^(?P<prefix>/[^-]*)-?(?P<tenant>)(?P<postfix>.*)$").unwrap();
        assert!(extract_tenant(&re, "/products").is_none());
    }

    #[test]
    fn no_match_returns_none() {
        assert!(extract_tenant(&regex(), "/_cluster/health").is_none());
    }
}
