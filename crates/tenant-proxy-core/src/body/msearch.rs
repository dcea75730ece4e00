//! MultiSearch NDJSON rewriting (§4.4)
//!
//! A `_msearch` body is NDJSON header+body pairs: a (possibly empty) header
//! object naming the target index, followed by an ordinary search body. Each
//! header's `index` is rewritten the same as a plain Search URL; each body
//! is treated as a Search body and (in index-per-tenant mode) has its
//! fields prefixed with that header's own base index.

use serde_json::Value;

use crate::config::Mode;
use crate::error::{RewriteError, Result};
use crate::template::Template;

use super::query_dsl::prefix_query_body;

pub fn rewrite_msearch(
    mode: Mode,
    tenant: &str,
    path_base_index: &str,
    shared_alias: &Template,
    index_per_tenant_template: &Template,
    body: &str,
) -> Result<String> {
    let trailing_newline = body.ends_with('\n');
    let mut lines = body.lines().filter(|l| !l.trim().is_empty());
    let mut out_lines = Vec::new();

    while let Some(header_line) = lines.next() {
        let header: Value = serde_json::from_str(header_line)
            .map_err(|e| RewriteError::body_parse(format!("invalid msearch header line: {e}")))?;
        let Value::Object(mut header_map) = header else {
            return Err(RewriteError::body_shape("msearch header line must be an object"));
        };

        let body_line = lines
            .next()
            .ok_or_else(|| RewriteError::body_shape("msearch header line has no matching body line"))?;
        let body_value: Value = serde_json::from_str(body_line)
            .map_err(|e| RewriteError::body_parse(format!("invalid msearch body line: {e}")))?;

        let header_base_index = header_map
            .get("index")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(path_base_index);
        if header_base_index.is_empty() {
            return Err(RewriteError::body_shape(
                "msearch header has no index and the request path carries none",
            ));
        }
        let header_base_index = header_base_index.to_string();

        let target = match mode {
            Mode::Shared => shared_alias.render(&header_base_index, tenant)?,
            Mode::IndexPerTenant => index_per_tenant_template.render(&header_base_index, tenant)?,
        };
        header_map.insert("index".to_string(), Value::String(target));

        let rewritten_body = match mode {
            Mode::Shared => body_value,
            Mode::IndexPerTenant => prefix_query_body(&header_base_index, body_value),
        };

        out_lines.push(Value::Object(header_map).to_string());
        out_lines.push(rewritten_body.to_string());
    }

    let mut out = out_lines.join("\n");
    if trailing_newline {
        out.push('\n');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(s: &str) -> Template {
        Template::new(s.to_string())
    }

    #[test]
    fn rewrites_header_index_in_shared_mode() {
        let body = "{}\n{\"query\":{\"match\":{\"field1\":\"v\"}}}\n";
        let out = rewrite_msearch(
            Mode::Shared,
            "tenant1",
            "products",
            &template("{index}-{tenant}"),
            &template("{index}-{tenant}-pt"),
            body,
        )
        .unwrap();
        let lines: Vec<&str> = out.lines().collect();
        let header: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(header["index"], "products-tenant1");
        let body_out: Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(body_out["query"]["match"]["field1"], "v");
    }

    #[test]
    fn prefixes_body_fields_in_index_per_tenant_mode() {
        let body = "{\"index\":\"orders\"}\n{\"query\":{\"match\":{\"field1\":\"v\"}}}\n";
        let out = rewrite_msearch(
            Mode::IndexPerTenant,
            "tenant2",
            "products",
            &template("{index}-{tenant}"),
            &template("{index}-{tenant}-pt"),
            body,
        )
        .unwrap();
        let lines: Vec<&str> = out.lines().collect();
        let header: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(header["index"], "orders-tenant2-pt");
        let body_out: Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(body_out["query"]["match"]["orders.field1"], "v");
    }

    #[test]
    fn missing_body_line_is_an_error() {
        let body = "{}\n";
        let err = rewrite_msearch(
            Mode::Shared,
            "tenant1",
            "products",
            &template("{index}-{tenant}"),
            &template("{index}-{tenant}-pt"),
            body,
        )
        .unwrap_err();
        assert!(matches!(err, RewriteError::BodyShape(_)));
    }
}
