//! Passthrough filter
//!
//! Identifies requests that MUST be forwarded byte-for-byte, before tenant
//! extraction or any rewriting is attempted.

/// Built-in cluster-management / catalog endpoints that are inherently
/// non-tenant. `/_cat` is listed but `/_cat/indices` is carved out below
/// since it is tenant-scoped.
const BUILTIN_PASSTHROUGH_PREFIXES: &[&str] = &[
    "/_cluster",
    "/_cat",
    "/_nodes",
    "/_snapshot",
    "/_tasks",
    "/_scripts",
    "/_security",
    "/_license",
    "/_ml",
    "/_watcher",
    "/_graph",
    "/_ccr",
    "/_alias",
    "/_template",
    "/_index_template",
    "/_component_template",
    "/_query_rules",
    "/_synonyms",
    "/_resolve",
    "/_data_stream",
    "/_dangling",
];

/// Returns true if `path` must be forwarded unmodified: the path matches a
/// user-configured passthrough prefix, or a built-in system prefix (with
/// `/_cat/indices` carved out of the `/_cat` passthrough because it is
/// tenant-scoped).
pub fn is_passthrough(path: &str, configured_prefixes: &[String]) -> bool {
    if configured_prefixes.iter().any(|p| path.starts_with(p.as_str())) {
        return true;
    }

    if path == "/_cat/indices" || path.starts_with("/_cat/indices/") {
        return false;
    }

    BUILTIN_PASSTHROUGH_PREFIXES
        .iter()
        .any(|p| path == *p || path.starts_with(&format!("{}/", p)))
}
