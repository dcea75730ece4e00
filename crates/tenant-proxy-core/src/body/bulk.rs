//! Bulk NDJSON rewriting (§4.4)
//!
//! A `_bulk` body is newline-delimited JSON: action lines (`index`, `create`,
//! `update`, or `delete`, each a single-key object) alternate with source
//! lines for every action except `delete`. We split on `\n` rather than
//! parsing as a JSON array, preserving line order and emitting the same
//! shape back out.

use regex::Regex;
use serde_json::{Map, Value};

use crate::config::Mode;
use crate::error::{RewriteError, Result};
use crate::template::Template;

use super::transform::decompose_index_name;

const BULK_ACTIONS: &[&str] = &["index", "create", "update", "delete"];

/// One parsed bulk entry: the action line plus its optional source line.
struct BulkEntry {
    action: &'static str,
    meta: Map<String, Value>,
    source: Option<Value>,
}

/// Rewrite a `_bulk` NDJSON body.
///
/// When the call is index-scoped (`/{idx}/_bulk`), `path_tenant` carries the
/// single tenant already resolved from the URL and `path_base_index` the
/// index segment; an entry's own `meta._index`, if present, overrides only
/// the base index, not the tenant. At the root `/_bulk` form there is no
/// path-embedded tenant: `path_tenant` is `None` and every entry's
/// `meta._index` is required and is itself a logical `base-tenant` name,
/// decomposed with `tenant_regex` to recover that entry's own tenant.
pub fn rewrite_bulk(
    mode: Mode,
    tenant_regex: &Regex,
    tenant_field: &str,
    path_tenant: Option<&str>,
    path_base_index: &str,
    shared_index_name: &Template,
    index_per_tenant_template: &Template,
    body: &str,
) -> Result<String> {
    let trailing_newline = body.ends_with('\n');
    let entries = parse_bulk(body)?;

    let mut out_lines = Vec::with_capacity(entries.len() * 2);
    for entry in entries {
        let entry_index_field = entry.meta.get("_index").and_then(Value::as_str);

        let (entry_base_index, entry_tenant) = match path_tenant {
            Some(tenant) => {
                let base_index = entry_index_field.filter(|s| !s.is_empty()).unwrap_or(path_base_index);
                if base_index.is_empty() {
                    return Err(RewriteError::body_shape(
                        "bulk entry has no _index and the request path carries none",
                    ));
                }
                (base_index.to_string(), tenant.to_string())
            }
            None => {
                let logical = entry_index_field.filter(|s| !s.is_empty()).ok_or_else(|| {
                    RewriteError::body_shape("root /_bulk entries must carry their own _index")
                })?;
                decompose_index_name(tenant_regex, logical)?
            }
        };

        let rendered_index = match mode {
            Mode::Shared => shared_index_name.render(&entry_base_index, &entry_tenant)?,
            Mode::IndexPerTenant => {
                index_per_tenant_template.render(&entry_base_index, &entry_tenant)?
            }
        };

        let mut meta = entry.meta;
        meta.insert("_index".to_string(), Value::String(rendered_index));
        out_lines.push(Value::Object(single_key(entry.action, Value::Object(meta))).to_string());

        if let Some(source) = entry.source {
            let rewritten = match (entry.action, mode) {
                ("delete", _) => None,
                (_, Mode::Shared) => Some(inject_tenant_field(source, tenant_field, &entry_tenant)),
                (_, Mode::IndexPerTenant) => Some(wrap_under_base_index(source, &entry_base_index)),
            };
            if let Some(rewritten) = rewritten {
                out_lines.push(rewritten.to_string());
            }
        }
    }

    let mut out = out_lines.join("\n");
    if trailing_newline {
        out.push('\n');
    }
    Ok(out)
}

fn single_key(key: &str, value: Value) -> Map<String, Value> {
    let mut m = Map::with_capacity(1);
    m.insert(key.to_string(), value);
    m
}

fn inject_tenant_field(source: Value, tenant_field: &str, tenant: &str) -> Value {
    match source {
        Value::Object(mut map) => {
            map.insert(tenant_field.to_string(), Value::String(tenant.to_string()));
            Value::Object(map)
        }
        other => other,
    }
}

fn wrap_under_base_index(source: Value, base_index: &str) -> Value {
    let mut wrapper = Map::with_capacity(1);
    wrapper.insert(base_index.to_string(), source);
    Value::Object(wrapper)
}

fn parse_bulk(body: &str) -> Result<Vec<BulkEntry>> {
    let mut lines = body.lines().filter(|l| !l.trim().is_empty());
    let mut entries = Vec::new();

    while let Some(line) = lines.next() {
        let parsed: Value = serde_json::from_str(line)
            .map_err(|e| RewriteError::body_parse(format!("invalid bulk action line: {e}")))?;
        let Value::Object(map) = parsed else {
            return Err(RewriteError::body_shape("bulk action line must be an object"));
        };
        if map.len() != 1 {
            return Err(RewriteError::body_shape(
                "bulk action line must have exactly one action key",
            ));
        }
        let (action_key, meta_value) = map.into_iter().next().expect("len checked above");
        let action = BULK_ACTIONS
            .iter()
            .find(|a| **a == action_key)
            .ok_or_else(|| {
                RewriteError::body_shape(format!("unknown bulk action: {action_key}"))
            })?;
        let Value::Object(meta) = meta_value else {
            return Err(RewriteError::body_shape("bulk action metadata must be an object"));
        };

        let source = if *action == "delete" {
            None
        } else {
            let source_line = lines.next().ok_or_else(|| {
                RewriteError::body_shape(format!("missing source line for '{action}' action"))
            })?;
            let source: Value = serde_json::from_str(source_line).map_err(|e| {
                RewriteError::body_parse(format!("invalid bulk source line: {e}"))
            })?;
            Some(source)
        };

        entries.push(BulkEntry { action, meta, source });
    }

    Ok(entries)
}
