//! Synthesised Search (§4.6): virtualised GET/MGET/SOURCE/DELETE-by-id
//!
//! Document-retrieval endpoints that bypass the query DSL are translated
//! into an `ids` query against `_search` (or `_delete_by_query`), so that
//! the same alias/prefix-based isolation the query DSL gets also applies to
//! these shortcuts.

use serde_json::{json, Value};

use crate::error::{RewriteError, Result};

/// `GET /{idx}/_get/{id}` and `GET /{idx}/_source/{id}` both become
/// `{query: {ids: {values: [id]}}, size: 1}`.
pub fn synth_get_by_id(id: &str) -> Result<Value> {
    if id.is_empty() {
        return Err(RewriteError::body_shape("document id must be non-empty"));
    }
    Ok(json!({"query": {"ids": {"values": [id]}}, "size": 1}))
}

/// `DELETE /{idx}/_delete/{id}` becomes `{query: {ids: {values: [id]}}}`.
pub fn synth_delete_by_id(id: &str) -> Result<Value> {
    if id.is_empty() {
        return Err(RewriteError::body_shape("document id must be non-empty"));
    }
    Ok(json!({"query": {"ids": {"values": [id]}}}))
}

/// `POST /{idx}/_mget` with `{ids: [...]}` or `{docs: [{_index, _id}, ...]}`
/// becomes `{query: {ids: {values: [...]}}, size: N}`.
///
/// For the `docs` form, every entry's `_index` (when present) must equal
/// `expected_logical_index` (the request's `base_index-tenant`), or the
/// request is rejected.
pub fn synth_mget(body: &Value, expected_logical_index: &str) -> Result<Value> {
    let Value::Object(map) = body else {
        return Err(RewriteError::body_shape("_mget body must be a JSON object"));
    };

    let ids = if let Some(ids) = map.get("ids") {
        extract_plain_ids(ids)?
    } else if let Some(docs) = map.get("docs") {
        extract_doc_ids(docs, expected_logical_index)?
    } else {
        return Err(RewriteError::body_shape(
            "_mget body must contain either 'ids' or 'docs'",
        ));
    };

    if ids.is_empty() {
        return Err(RewriteError::body_shape("_mget body must name at least one document"));
    }

    let size = ids.len();
    Ok(json!({"query": {"ids": {"values": ids}}, "size": size}))
}

fn extract_plain_ids(ids: &Value) -> Result<Vec<String>> {
    let Value::Array(items) = ids else {
        return Err(RewriteError::body_shape("'ids' must be an array"));
    };
    items
        .iter()
        .map(|v| match v {
            Value::String(s) if !s.is_empty() => Ok(s.clone()),
            _ => Err(RewriteError::body_shape("'ids' entries must be non-empty strings")),
        })
        .collect()
}

fn extract_doc_ids(docs: &Value, expected_logical_index: &str) -> Result<Vec<String>> {
    let Value::Array(items) = docs else {
        return Err(RewriteError::body_shape("'docs' must be an array"));
    };
    items
        .iter()
        .map(|doc| {
            let Value::Object(doc_map) = doc else {
                return Err(RewriteError::body_shape("'docs' entries must be objects"));
            };
            if let Some(Value::String(idx)) = doc_map.get("_index") {
                if idx != expected_logical_index {
                    return Err(RewriteError::body_shape(format!(
                        "'docs' entry references index '{idx}', expected '{expected_logical_index}'"
                    )));
                }
            }
            match doc_map.get("_id") {
                Some(Value::String(id)) if !id.is_empty() => Ok(id.clone()),
                _ => Err(RewriteError::body_shape(
                    "'docs' entries must have a non-empty '_id' string",
                )),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthesises_get_by_id() {
        let out = synth_get_by_id("42").unwrap();
        assert_eq!(out, json!({"query": {"ids": {"values": ["42"]}}, "size": 1}));
    }

    #[test]
    fn rejects_empty_get_id() {
        assert!(synth_get_by_id("").is_err());
    }

    #[test]
    fn synthesises_delete_by_id() {
        let out = synth_delete_by_id("7").unwrap();
        assert_eq!(out, json!({"query": {"ids": {"values": ["7"]}}}));
    }

    #[test]
    fn synthesises_mget_from_plain_ids() {
        let body = json!({"ids": ["1", "2"]});
        let out = synth_mget(&body, "products-tenant1").unwrap();
        assert_eq!(out, json!({"query": {"ids": {"values": ["1", "2"]}}, "size": 2}));
    }

    #[test]
    fn synthesises_mget_from_docs_with_matching_index() {
        let body = json!({"docs": [{"_index": "products-tenant1", "_id": "1"}]});
        let out = synth_mget(&body, "products-tenant1").unwrap();
        assert_eq!(out, json!({"query": {"ids": {"values": ["1"]}}, "size": 1}));
    }

    #[test]
    fn rejects_mget_docs_with_mismatched_index() {
        let body = json!({"docs": [{"_index": "other-tenant1", "_id": "1"}]});
        let err = synth_mget(&body, "products-tenant1").unwrap_err();
        assert!(matches!(err, RewriteError::BodyShape(_)));
    }

    #[test]
    fn rejects_mget_without_ids_or_docs() {
        let body = json!({});
        assert!(synth_mget(&body, "products-tenant1").is_err());
    }

    #[test]
    fn rejects_mget_docs_entry_missing_id() {
        let body = json!({"docs": [{"_index": "products-tenant1"}]});
        assert!(synth_mget(&body, "products-tenant1").is_err());
    }
}
