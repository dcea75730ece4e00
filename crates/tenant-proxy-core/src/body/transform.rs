//! Transform/Rollup index-reference rewriting (§4.4)
//!
//! `_transform` and `_rollup` jobs are root-level endpoints: they carry no
//! index segment in the URL, so the tenant extractor never runs on their
//! path. Instead, every index reference inside the job body is itself a
//! *physical* index name matching `tenant_regex` (e.g. `products-tenant1`),
//! and is decomposed back into its logical `(base_index, tenant)` pair
//! before being re-rendered in the target mode's form.

use regex::Regex;
use serde_json::Value;

use crate::config::Mode;
use crate::error::{RewriteError, Result};
use crate::template::Template;

/// Split a physical index name back into `(base_index, tenant)` using the
/// same named-group regex the extractor applies to URL paths.
pub fn decompose_index_name(tenant_regex: &Regex, physical_name: &str) -> Result<(String, String)> {
    let caps = tenant_regex.captures(physical_name).ok_or_else(|| {
        RewriteError::index_name(format!(
            "'{physical_name}' does not match the configured tenant_regex"
        ))
    })?;

    let tenant = caps.name("tenant").map(|m| m.as_str()).unwrap_or("");
    if tenant.is_empty() {
        return Err(RewriteError::index_name(format!(
            "'{physical_name}' matched tenant_regex but the tenant group is empty"
        )));
    }
    let prefix = caps.name("prefix").map(|m| m.as_str()).unwrap_or("");
    let postfix = caps.name("postfix").map(|m| m.as_str()).unwrap_or("");
    let base_index = format!("{prefix}{postfix}");
    if base_index.is_empty() {
        return Err(RewriteError::index_name(format!(
            "'{physical_name}' decomposed to an empty base index"
        )));
    }

    Ok((base_index, tenant.to_string()))
}

fn render_for_mode(
    mode: Mode,
    shared_alias: &Template,
    index_per_tenant_template: &Template,
    base_index: &str,
    tenant: &str,
) -> Result<String> {
    match mode {
        Mode::Shared => shared_alias.render(base_index, tenant),
        Mode::IndexPerTenant => index_per_tenant_template.render(base_index, tenant),
    }
}

fn render_for_dest_mode(
    mode: Mode,
    shared_index_name: &Template,
    index_per_tenant_template: &Template,
    base_index: &str,
    tenant: &str,
) -> Result<String> {
    match mode {
        Mode::Shared => shared_index_name.render(base_index, tenant),
        Mode::IndexPerTenant => index_per_tenant_template.render(base_index, tenant),
    }
}

/// Rewrite a single index-reference value: a string or an array of strings.
fn rewrite_reference(
    tenant_regex: &Regex,
    value: Value,
    render: &dyn Fn(&str, &str) -> Result<String>,
) -> Result<Value> {
    match value {
        Value::String(s) => {
            let (base_index, tenant) = decompose_index_name(tenant_regex, &s)?;
            Ok(Value::String(render(&base_index, &tenant)?))
        }
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(rewrite_reference(tenant_regex, item, render)?);
            }
            Ok(Value::Array(out))
        }
        other => Ok(other),
    }
}

/// Rewrite every source/destination index reference in a `_transform` or
/// `_rollup` job body in place, per the selected mode.
pub fn rewrite_transform_body(
    mode: Mode,
    tenant_regex: &Regex,
    shared_index_name: &Template,
    shared_alias: &Template,
    index_per_tenant_template: &Template,
    body: Value,
) -> Result<Value> {
    let Value::Object(mut map) = body else {
        return Ok(body);
    };

    if let Some(source) = map.remove("source") {
        let Value::Object(mut source_map) = source else {
            map.insert("source".to_string(), source);
            return Ok(Value::Object(map));
        };
        for key in ["index", "index_pattern"] {
            if let Some(v) = source_map.remove(key) {
                let rewritten = rewrite_reference(tenant_regex, v, &|b, t| {
                    render_for_mode(mode, shared_alias, index_per_tenant_template, b, t)
                })?;
                source_map.insert(key.to_string(), rewritten);
            }
        }
        map.insert("source".to_string(), Value::Object(source_map));
    }

    if let Some(dest) = map.remove("dest") {
        let Value::Object(mut dest_map) = dest else {
            map.insert("dest".to_string(), dest);
            return Ok(Value::Object(map));
        };
        for key in ["index", "rollup_index"] {
            if let Some(v) = dest_map.remove(key) {
                let rewritten = rewrite_reference(tenant_regex, v, &|b, t| {
                    render_for_dest_mode(mode, shared_index_name, index_per_tenant_template, b, t)
                })?;
                dest_map.insert(key.to_string(), rewritten);
            }
        }
        map.insert("dest".to_string(), Value::Object(dest_map));
    }

    Ok(Value::Object(map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tenant_regex() -> Regex {
        Regex::new("^(?P<prefix>[^-]+)-(?P<tenant>[^-]+)(?P<postfix>.*)$").unwrap()
    }

    #[test]
    fn decomposes_a_physical_index_name() {
        let (base, tenant) = decompose_index_name(&tenant_regex(), "products-tenant1").unwrap();
        assert_eq!(base, "products");
        assert_eq!(tenant, "tenant1");
    }

    #[test]
    fn rejects_non_matching_name() {
        assert!(decompose_index_name(&tenant_regex(), "noseparator").is_err());
    }

    #[test]
    fn rewrites_transform_body_in_shared_mode() {
        let body = json!({
            "source": {"index": "products-tenant1"},
            "dest": {"index": "products-tenant1"}
        });
        let out = rewrite_transform_body(
            Mode::Shared,
            &tenant_regex(),
            &Template::new("shared-index"),
            &Template::new("{index}-{tenant}"),
            &Template::new("{index}-{tenant}-pt"),
            body,
        )
        .unwrap();
        assert_eq!(out["source"]["index"], "products-tenant1");
        assert_eq!(out["dest"]["index"], "shared-index");
    }

    #[test]
    fn rewrites_transform_body_index_per_tenant_mode() {
        let body = json!({
            "source": {"index_pattern": ["products-tenant1"]},
            "dest": {"rollup_index": "products-tenant1"}
        });
        let out = rewrite_transform_body(
            Mode::IndexPerTenant,
            &tenant_regex(),
            &Template::new("shared-index"),
            &Template::new("{index}-{tenant}"),
            &Template::new("{index}-{tenant}-pt"),
            body,
        )
        .unwrap();
        assert_eq!(out["source"]["index_pattern"], json!(["products-tenant1-pt"]));
        assert_eq!(out["dest"]["rollup_index"], "products-tenant1-pt");
    }
}
