//! Path Router
//!
//! Classifies a post-tenant path (plus HTTP method) into a [`RouteResult`]
//! tagged with an [`Action`]. Implemented as an explicit, order-sensitive
//! list of matcher functions; the first that matches wins. State is not
//! carried between requests.

use crate::error::{RewriteError, Result};
use crate::http::Method;

/// The endpoint shape a request was classified as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// `_search` / `_doc/_search`, including the root form.
    Search,
    /// `_msearch`: newline-delimited header+body pairs.
    MultiSearch,
    /// `_count`: a Search whose body is wrapped with `size: 0`.
    Count,
    /// `_doc`, `_doc/{id}`, `_create/{id}`.
    Index,
    /// `_update/{id}`.
    Update,
    /// `_update_by_query`.
    UpdateByQuery,
    /// `_delete_by_query`, and the synthesised target of `_delete/{id}`.
    DeleteByQuery,
    /// `_mapping`.
    Mapping,
    /// `PUT /{idx}`.
    CreateIndex,
    /// `DELETE /{idx}`.
    DeleteIndex,
    /// URL-only rewrite endpoints: `_settings`, `_search_shards`, `_field_caps`,
    /// `_terms_enum`, `_cache/clear`, `_analyze`, `_rank_eval`, `_explain[/{id}]`,
    /// `_validate/query`, `_search/template`.
    IndexScopedPassthrough,
    /// `_get/{id}`: synthesised into a Search.
    Get,
    /// `_mget`: synthesised into a Search.
    Mget,
    /// `_source[/{id}]`.
    Source,
    /// `_delete/{id}`: synthesised into a DeleteByQuery.
    DeleteById,
    /// `_bulk`, at the root or under an index.
    Bulk,
    /// `_cat/indices[/{idx}]`.
    CatIndices,
    /// `_transform/...`.
    Transform,
    /// `_rollup/...`.
    Rollup,
}

/// The outcome of routing a single request.
#[derive(Debug, Clone)]
pub struct RouteResult {
    pub action: Action,
    /// Logical base index; empty for root-level endpoints that carry no
    /// path-embedded index (`/_bulk`, `/_cat/indices`, `/_transform/...`).
    pub base_index: String,
    pub doc_id: Option<String>,
    /// The post-tenant path that was routed.
    pub path: String,
    pub method: Method,
    /// The original, pre-extraction path, preserved for passthrough
    /// byte-for-byte forwarding and for diagnostics.
    pub raw_path: String,
}

fn segments(path: &str) -> Vec<&str> {
    path.trim_start_matches('/').split('/').filter(|s| !s.is_empty()).collect()
}

fn validate_index(idx: &str) -> Result<()> {
    if idx.is_empty() {
        return Err(RewriteError::classification("index segment is empty"));
    }
    if idx.contains(',') {
        return Err(RewriteError::classification(format!(
            "multiple indices are not supported: '{}'",
            idx
        )));
    }
    Ok(())
}

/// Route a post-tenant, index-scoped path: one whose first segment is the
/// base index name (already stripped of its tenant suffix by the extractor),
/// e.g. `/products/_search`.
///
/// Root-level endpoints (`/_search`, `/_bulk`, `/_cat/indices`,
/// `/_transform/...`, `/_rollup/...`) never reach this function — the
/// orchestrator recognises them from the *raw* path before tenant
/// extraction is even attempted, since they carry no index segment of their
/// own. See [`classify_root`].
pub fn route(method: Method, raw_path: &str, path: &str) -> Result<RouteResult> {
    let segs = segments(path);

    let result = |action: Action, base_index: &str, doc_id: Option<&str>| {
        Ok(RouteResult {
            action,
            base_index: base_index.to_string(),
            doc_id: doc_id.map(|s| s.to_string()),
            path: path.to_string(),
            method,
            raw_path: raw_path.to_string(),
        })
    };

    match segs.as_slice() {
        [idx, "_search" | "_msearch" | "_count"] if matches!(method, Method::Get | Method::Post) => {
            validate_index(idx)?;
            let action = match segs[1] {
                "_msearch" => Action::MultiSearch,
                "_count" => Action::Count,
                _ => Action::Search,
            };
            result(action, idx, None)
        }
        [idx, "_doc", "_search"] if matches!(method, Method::Get | Method::Post) => {
            validate_index(idx)?;
            result(Action::Search, idx, None)
        }
        [idx, "_doc"] if method == Method::Post => {
            validate_index(idx)?;
            result(Action::Index, idx, None)
        }
        [idx, "_doc", id] if matches!(method, Method::Post | Method::Put) => {
            validate_index(idx)?;
            result(Action::Index, idx, Some(id))
        }
        [idx, "_create", id] if matches!(method, Method::Put | Method::Post) => {
            validate_index(idx)?;
            result(Action::Index, idx, Some(id))
        }
        ["_bulk"] if method == Method::Post => result(Action::Bulk, "", None),
        [idx, "_bulk"] if method == Method::Post => {
            validate_index(idx)?;
            result(Action::Bulk, idx, None)
        }
        [idx, "_update", id] if method == Method::Post => {
            validate_index(idx)?;
            result(Action::Update, idx, Some(id))
        }
        [idx, "_update_by_query"] if method == Method::Post => {
            validate_index(idx)?;
            result(Action::UpdateByQuery, idx, None)
        }
        [idx, "_delete", id] if method == Method::Delete => {
            validate_index(idx)?;
            result(Action::DeleteById, idx, Some(id))
        }
        [idx, "_delete_by_query"] if method == Method::Post => {
            validate_index(idx)?;
            result(Action::DeleteByQuery, idx, None)
        }
        [idx, "_mapping"] if matches!(method, Method::Put | Method::Post) => {
            validate_index(idx)?;
            result(Action::Mapping, idx, None)
        }
        [idx] if matches!(method, Method::Put | Method::Delete) => {
            validate_index(idx)?;
            let action = if method == Method::Put {
                Action::CreateIndex
            } else {
                Action::DeleteIndex
            };
            result(action, idx, None)
        }
        [idx, "_settings"]
        | [idx, "_search_shards"]
        | [idx, "_field_caps"]
        | [idx, "_terms_enum"]
        | [idx, "_analyze"]
        | [idx, "_rank_eval"]
        | [idx, "_explain"] => {
            validate_index(idx)?;
            result(Action::IndexScopedPassthrough, idx, None)
        }
        [idx, "_explain", id] => {
            validate_index(idx)?;
            result(Action::IndexScopedPassthrough, idx, Some(id))
        }
        [idx, "_cache", "clear"] => {
            validate_index(idx)?;
            result(Action::IndexScopedPassthrough, idx, None)
        }
        [idx, "_validate", "query"] => {
            validate_index(idx)?;
            result(Action::IndexScopedPassthrough, idx, None)
        }
        [idx, "_search", "template"] => {
            validate_index(idx)?;
            result(Action::IndexScopedPassthrough, idx, None)
        }
        [idx, "_mget"] if method == Method::Post => {
            validate_index(idx)?;
            result(Action::Mget, idx, None)
        }
        [idx, "_get", id] if method == Method::Get => {
            validate_index(idx)?;
            result(Action::Get, idx, Some(id))
        }
        [idx, "_source"] if method == Method::Post => {
            validate_index(idx)?;
            result(Action::Source, idx, None)
        }
        [idx, "_source", id] if method == Method::Get => {
            validate_index(idx)?;
            result(Action::Source, idx, Some(id))
        }
        [idx, "_cat", "indices"] if method == Method::Get => {
            // unusual shape: tenant-embedded first segment followed by
            // `_cat/indices`; not part of the fixed table but harmless to
            // reject explicitly rather than silently misroute.
            let _ = idx;
            Err(RewriteError::classification(
                "unsupported request: _cat/indices is not index-scoped",
            ))
        }
        _ => Err(RewriteError::classification(format!(
            "unsupported request: {} {}",
            method.as_str(),
            path
        ))),
    }
}

/// Classify the raw (pre-extraction) path for root-level endpoints that
/// carry no path-embedded index segment: `/_search`, `/_bulk`,
/// `/_cat/indices[/...]`, `/_transform/...`, `/_rollup/...`.
///
/// Returns `None` if `raw_path` is not one of these shapes, signalling the
/// orchestrator to fall through to ordinary tenant extraction + [`route`].
pub fn classify_root(method: Method, raw_path: &str) -> Option<Result<RouteResult>> {
    let segs = segments(raw_path);

    let result = |action: Action, base_index: &str, doc_id: Option<&str>| {
        Ok(RouteResult {
            action,
            base_index: base_index.to_string(),
            doc_id: doc_id.map(|s| s.to_string()),
            path: raw_path.to_string(),
            method,
            raw_path: raw_path.to_string(),
        })
    };

    match segs.as_slice() {
        ["_search"] if matches!(method, Method::Get | Method::Post) => {
            Some(result(Action::Search, "", None))
        }
        ["_bulk"] if method == Method::Post => Some(result(Action::Bulk, "", None)),
        ["_cat", "indices"] if method == Method::Get => Some(result(Action::CatIndices, "", None)),
        ["_cat", "indices", idx] if method == Method::Get => {
            if let Err(e) = validate_index(idx) {
                return Some(Err(e));
            }
            Some(result(Action::CatIndices, idx, None))
        }
        [first, ..]
            if (*first == "_transform" || *first == "_rollup")
                && matches!(method, Method::Put | Method::Post) =>
        {
            let action = if *first == "_transform" {
                Action::Transform
            } else {
                Action::Rollup
            };
            Some(result(action, "", None))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_search_under_index() {
        let r = route(Method::Post, "/products/_search", "/products/_search").unwrap();
        assert_eq!(r.action, Action::Search);
        assert_eq!(r.base_index, "products");
    }

    #[test]
    fn routes_msearch_as_distinct_action() {
        let r = route(Method::Post, "/products/_msearch", "/products/_msearch").unwrap();
        assert_eq!(r.action, Action::MultiSearch);
    }

    #[test]
    fn routes_count_as_distinct_action() {
        let r = route(Method::Get, "/products/_count", "/products/_count").unwrap();
        assert_eq!(r.action, Action::Count);
    }

    #[test]
    fn rejects_empty_index() {
        assert!(route(Method::Post, "//_search", "//_search").is_err());
    }

    #[test]
    fn rejects_comma_index() {
        let err = route(Method::Post, "/a,b/_search", "/a,b/_search").unwrap_err();
        assert!(matches!(err, RewriteError::Classification(_)));
    }

    #[test]
    fn routes_doc_index_with_and_without_id() {
        let r = route(Method::Post, "/products/_doc", "/products/_doc").unwrap();
        assert_eq!(r.action, Action::Index);
        assert_eq!(r.doc_id, None);

        let r = route(Method::Put, "/products/_doc/1", "/products/_doc/1").unwrap();
        assert_eq!(r.action, Action::Index);
        assert_eq!(r.doc_id, Some("1".to_string()));
    }

    #[test]
    fn routes_create_as_index() {
        let r = route(Method::Put, "/products/_create/1", "/products/_create/1").unwrap();
        assert_eq!(r.action, Action::Index);
        assert_eq!(r.doc_id, Some("1".to_string()));
    }

    #[test]
    fn routes_bulk_under_index_and_at_root() {
        let r = route(Method::Post, "/products/_bulk", "/products/_bulk").unwrap();
        assert_eq!(r.action, Action::Bulk);
        assert_eq!(r.base_index, "products");

        let r = route(Method::Post, "/_bulk", "/_bulk").unwrap();
        assert_eq!(r.action, Action::Bulk);
        assert_eq!(r.base_index, "");
    }

    #[test]
    fn delete_by_id_becomes_delete_by_id_action() {
        let r = route(Method::Delete, "/products/_delete/1", "/products/_delete/1").unwrap();
        assert_eq!(r.action, Action::DeleteById);
        assert_eq!(r.doc_id, Some("1".to_string()));
    }

    #[test]
    fn create_delete_index_dispatch_on_method() {
        let r = route(Method::Put, "/products", "/products").unwrap();
        assert_eq!(r.action, Action::CreateIndex);
        let r = route(Method::Delete, "/products", "/products").unwrap();
        assert_eq!(r.action, Action::DeleteIndex);
    }

    #[test]
    fn index_scoped_passthrough_endpoints_route() {
        for path in [
            "/products/_settings",
            "/products/_search_shards",
            "/products/_field_caps",
            "/products/_terms_enum",
            "/products/_analyze",
            "/products/_rank_eval",
            "/products/_explain",
            "/products/_cache/clear",
            "/products/_validate/query",
            "/products/_search/template",
        ] {
            let r = route(Method::Post, path, path).unwrap();
            assert_eq!(r.action, Action::IndexScopedPassthrough, "path={path}");
        }
        let r = route(Method::Get, "/products/_explain/42", "/products/_explain/42").unwrap();
        assert_eq!(r.action, Action::IndexScopedPassthrough);
        assert_eq!(r.doc_id, Some("42".to_string()));
    }

    #[test]
    fn mget_get_source_route() {
        let r = route(Method::Post, "/products/_mget", "/products/_mget").unwrap();
        assert_eq!(r.action, Action::Mget);

        let r = route(Method::Get, "/products/_get/42", "/products/_get/42").unwrap();
        assert_eq!(r.action, Action::Get);
        assert_eq!(r.doc_id, Some("42".to_string()));

        let r = route(Method::Get, "/products/_source/42", "/products/_source/42").unwrap();
        assert_eq!(r.action, Action::Source);

        let r = route(Method::Post, "/products/_source", "/products/_source").unwrap();
        assert_eq!(r.action, Action::Source);
        assert_eq!(r.doc_id, None);
    }

    #[test]
    fn unknown_shape_is_classification_error() {
        let err = route(Method::Post, "/products/_unknown_endpoint", "/products/_unknown_endpoint")
            .unwrap_err();
        assert!(matches!(err, RewriteError::Classification(_)));
    }

    #[test]
    fn classify_root_recognises_root_endpoints() {
        assert!(matches!(
            classify_root(Method::Get, "/_search").unwrap().unwrap().action,
            Action::Search
        ));
        assert!(matches!(
            classify_root(Method::Post, "/_bulk").unwrap().unwrap().action,
            Action::Bulk
        ));
        assert!(matches!(
            classify_root(Method::Get, "/_cat/indices").unwrap().unwrap().action,
            Action::CatIndices
        ));
        assert!(matches!(
            classify_root(Method::Put, "/_transform/my-job").unwrap().unwrap().action,
            Action::Transform
        ));
        assert!(matches!(
            classify_root(Method::Post, "/_rollup/jobs/my-job/_start")
                .unwrap()
                .unwrap()
                .action,
            Action::Rollup
        ));
    }

    #[test]
    fn classify_root_falls_through_for_index_scoped_paths() {
        assert!(classify_root(Method::Post, "/products-tenant1/_search").is_none());
    }
}
