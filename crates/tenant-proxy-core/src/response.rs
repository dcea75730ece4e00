//! CatIndices response rewriter (§4.7)
//!
//! When forwarding `/_cat/indices[/...]`, the downstream response names
//! physical indices. We decompose each physical name back to its logical
//! `(index, tenant)` pair and surface the tenant as a `tenant_id` field
//! (JSON) or `TENANT_ID` column (plain text). Bodies that don't decompose
//! cleanly are passed through untouched rather than rejected: this is a
//! response, not a request, and failing the whole forward has no client to
//! report the error to.

use regex::Regex;
use serde_json::Value;

use crate::body::transform::decompose_index_name;

/// Rewrite a JSON `/_cat/indices?format=json` response body: an array of
/// objects, each with an `index` field naming a physical index.
pub fn rewrite_cat_indices_json(tenant_regex: &Regex, body: &str) -> String {
    let Ok(parsed) = serde_json::from_str::<Value>(body) else {
        return body.to_string();
    };
    let Value::Array(items) = parsed else {
        return body.to_string();
    };

    let rewritten: Vec<Value> = items
        .into_iter()
        .map(|item| rewrite_cat_indices_entry(tenant_regex, item))
        .collect();

    serde_json::to_string(&Value::Array(rewritten)).unwrap_or_else(|_| body.to_string())
}

fn rewrite_cat_indices_entry(tenant_regex: &Regex, entry: Value) -> Value {
    let Value::Object(mut map) = entry else {
        return entry;
    };
    let Some(Value::String(physical)) = map.get("index").cloned() else {
        return Value::Object(map);
    };
    if let Ok((base_index, tenant)) = decompose_index_name(tenant_regex, &physical) {
        map.insert("index".to_string(), Value::String(base_index));
        map.insert("tenant_id".to_string(), Value::String(tenant));
    }
    Value::Object(map)
}

/// Rewrite a `/_cat/indices` `text/plain` response: the header line gains a
/// `TENANT_ID` column, and each data row gains the tenant derived from its
/// first column (the physical index name).
pub fn rewrite_cat_indices_text(tenant_regex: &Regex, body: &str) -> String {
    if body.trim().is_empty() {
        return body.to_string();
    }

    let mut lines = body.lines();
    let Some(header) = lines.next() else {
        return body.to_string();
    };

    let mut out = vec![format!("{header} TENANT_ID")];
    for line in lines {
        if line.trim().is_empty() {
            out.push(line.to_string());
            continue;
        }
        let physical = line.split_whitespace().next().unwrap_or("");
        match decompose_index_name(tenant_regex, physical) {
            Ok((_, tenant)) => out.push(format!("{line} {tenant}")),
            Err(_) => out.push(line.to_string()),
        }
    }

    let mut joined = out.join("\n");
    if body.ends_with('\n') {
        joined.push('\n');
    }
    joined
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant_regex() -> Regex {
        Regex::new("^(?P<prefix>[^-]+)-(?P<tenant>[^-]+)(?P<postfix>.*)$").unwrap()
    }

    #[test]
    fn rewrites_json_cat_indices_entries() {
        let body = r#"[{"health":"green","index":"products-tenant1","docs.count":"3"}]"#;
        let out = rewrite_cat_indices_json(&tenant_regex(), body);
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[0]["index"], "products");
        assert_eq!(parsed[0]["tenant_id"], "tenant1");
    }

    #[test]
    fn leaves_non_decomposable_index_untouched() {
        let body = r#"[{"index":"noseparator"}]"#;
        let out = rewrite_cat_indices_json(&tenant_regex(), body);
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[0]["index"], "noseparator");
        assert!(parsed[0].get("tenant_id").is_none());
    }

    #[test]
    fn passes_through_invalid_json_untouched() {
        let body = "not json";
        assert_eq!(rewrite_cat_indices_json(&tenant_regex(), body), body);
    }

    #[test]
    fn rewrites_text_header_and_rows() {
        let body = "index health status\nproducts-tenant1 green open\n";
        let out = rewrite_cat_indices_text(&tenant_regex(), body);
        let mut lines = out.lines();
        assert_eq!(lines.next().unwrap(), "index health status TENANT_ID");
        assert_eq!(lines.next().unwrap(), "products-tenant1 green open tenant1");
    }

    #[test]
    fn empty_text_body_is_untouched() {
        assert_eq!(rewrite_cat_indices_text(&tenant_regex(), ""), "");
    }
}
