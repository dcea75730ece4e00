//! Top-level orchestration: classify, rewrite, forward (§2, §6).
//!
//! [`rewrite_request`] is the single entry point the boundary adapter calls.
//! It chains the passthrough filter, deny-list check, tenant extractor,
//! path router, mode dispatcher, and body rewriter, and returns a
//! [`RewriteOutcome`] ready to forward upstream.

use serde_json::Value;

use crate::body::{bulk, mapping, msearch, query_dsl, synth, transform};
use crate::config::{CompiledConfig, Mode};
use crate::dispatcher::{render_read_target, render_write_target, rewrite_first_segment};
use crate::error::{RewriteError, Result};
use crate::extractor::extract_tenant;
use crate::http::Method;
use crate::passthrough::is_passthrough;
use crate::request::{RewriteOutcome, Request};
use crate::router::{classify_root, route, Action, RouteResult};

/// Classify and rewrite one request. Returns an error for every malformed
/// or disallowed request; the boundary adapter maps every variant to an
/// HTTP 400 response.
pub fn rewrite_request(cfg: &CompiledConfig, request: Request) -> Result<RewriteOutcome> {
    if is_passthrough(&request.path, &cfg.passthrough_paths) {
        return Ok(RewriteOutcome {
            path: request.path,
            query: request.query,
            body: request.body,
            method: request.method,
            tenant: String::new(),
            passthrough: true,
            response_rewrite_required: false,
        });
    }

    check_deny_list(cfg, &request.path)?;

    if let Some(root_result) = classify_root(request.method, &request.path) {
        let route_result = root_result?;
        return dispatch_root(cfg, route_result, request);
    }

    let extraction = extract_tenant(&cfg.tenant_regex, &request.path)
        .ok_or_else(|| RewriteError::TenantExtraction(format!("no match for path '{}'", request.path)))?;

    let route_result = route(request.method, &request.path, &extraction.rewritten_path)?;

    dispatch_indexed(cfg, route_result, extraction.tenant, request)
}

fn check_deny_list(cfg: &CompiledConfig, raw_path: &str) -> Result<()> {
    let first_segment = raw_path.trim_start_matches('/').split('/').next().unwrap_or("");
    if first_segment.is_empty() {
        return Ok(());
    }
    if cfg.shared_deny_patterns.iter().any(|p| p.is_match(first_segment)) {
        return Err(RewriteError::DenyListed(format!(
            "direct access to '{first_segment}' is not permitted"
        )));
    }
    Ok(())
}

fn parse_json_body(body: &[u8]) -> Result<Value> {
    if body.is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_slice(body).map_err(|e| RewriteError::body_parse(format!("invalid JSON body: {e}")))
}

fn body_to_bytes(value: &Value) -> Vec<u8> {
    serde_json::to_vec(value).unwrap_or_default()
}

/// Root-level endpoints that carry no path-embedded index: `/_search`,
/// `/_bulk`, `/_cat/indices[/...]`, `/_transform/...`, `/_rollup/...`.
fn dispatch_root(cfg: &CompiledConfig, route_result: RouteResult, request: Request) -> Result<RewriteOutcome> {
    match route_result.action {
        Action::Search => {
            let index_param = request
                .query
                .get("index")
                .filter(|s| !s.is_empty())
                .ok_or_else(|| RewriteError::Classification("/_search requires an 'index' query parameter".into()))?;
            let (base_index, tenant) = transform::decompose_index_name(&cfg.tenant_regex, index_param)?;
            validate_no_comma(&base_index)?;

            let target = render_read_target(cfg, &base_index, &tenant)?;
            let mut query = request.query;
            query.insert("index".to_string(), target);

            let body = rewrite_search_body(cfg, &base_index, request.body)?;

            Ok(RewriteOutcome {
                path: request.path,
                query,
                body,
                method: request.method,
                tenant,
                passthrough: false,
                response_rewrite_required: false,
            })
        }
        Action::Bulk => {
            let body_str = std::str::from_utf8(&request.body)
                .map_err(|e| RewriteError::body_parse(format!("bulk body is not valid UTF-8: {e}")))?;
            let rewritten = bulk::rewrite_bulk(
                cfg.mode,
                &cfg.tenant_regex,
                &cfg.shared_tenant_field,
                None,
                "",
                &cfg.shared_index_name,
                &cfg.index_per_tenant_template,
                body_str,
            )?;
            Ok(RewriteOutcome {
                path: request.path,
                query: request.query,
                body: rewritten.into_bytes(),
                method: request.method,
                tenant: String::new(),
                passthrough: false,
                response_rewrite_required: false,
            })
        }
        Action::CatIndices => {
            let path = if route_result.base_index.is_empty() {
                "/_cat/indices".to_string()
            } else {
                let (base_index, tenant) =
                    transform::decompose_index_name(&cfg.tenant_regex, &route_result.base_index)?;
                let target = render_write_target(cfg, &base_index, &tenant)?;
                format!("/_cat/indices/{target}")
            };
            Ok(RewriteOutcome {
                path,
                query: request.query,
                body: request.body,
                method: request.method,
                tenant: String::new(),
                passthrough: false,
                response_rewrite_required: true,
            })
        }
        Action::Transform | Action::Rollup => {
            let body_value = parse_json_body(&request.body)?;
            let rewritten = transform::rewrite_transform_body(
                cfg.mode,
                &cfg.tenant_regex,
                &cfg.shared_index_name,
                &cfg.shared_alias,
                &cfg.index_per_tenant_template,
                body_value,
            )?;
            Ok(RewriteOutcome {
                path: request.path,
                query: request.query,
                body: body_to_bytes(&rewritten),
                method: request.method,
                tenant: String::new(),
                passthrough: false,
                response_rewrite_required: false,
            })
        }
        _ => Err(RewriteError::Classification(format!(
            "unsupported root-level request: {}",
            route_result.raw_path
        ))),
    }
}

/// In index-per-tenant mode, prefix the query body's field references with
/// `base_index + "."`; in shared mode the body is passed through untouched
/// and byte-identical.
fn rewrite_search_body(cfg: &CompiledConfig, base_index: &str, body: Vec<u8>) -> Result<Vec<u8>> {
    match cfg.mode {
        Mode::Shared => Ok(body),
        Mode::IndexPerTenant => {
            let value = parse_json_body(&body)?;
            Ok(body_to_bytes(&query_dsl::prefix_query_body(base_index, value)))
        }
    }
}

fn validate_no_comma(base_index: &str) -> Result<()> {
    if base_index.contains(',') {
        return Err(RewriteError::Classification(format!(
            "multiple indices are not supported: '{base_index}'"
        )));
    }
    Ok(())
}

fn dispatch_indexed(
    cfg: &CompiledConfig,
    route_result: RouteResult,
    tenant: String,
    request: Request,
) -> Result<RewriteOutcome> {
    let base_index = route_result.base_index.clone();
    let original_method = request.method;

    let (path, query, body, method) = match route_result.action {
        Action::Search => {
            let target = render_read_target(cfg, &base_index, &tenant)?;
            let path = rewrite_first_segment(&route_result.path, &target);
            let body = rewrite_search_body(cfg, &base_index, request.body)?;
            (path, request.query, body, original_method)
        }
        Action::MultiSearch => {
            let body_str = std::str::from_utf8(&request.body)
                .map_err(|e| RewriteError::body_parse(format!("msearch body is not valid UTF-8: {e}")))?;
            let rewritten = msearch::rewrite_msearch(
                cfg.mode,
                &tenant,
                &base_index,
                &cfg.shared_alias,
                &cfg.index_per_tenant_template,
                body_str,
            )?;
            let target = render_read_target(cfg, &base_index, &tenant)?;
            let path = rewrite_first_segment(&route_result.path, &target);
            (path, request.query, rewritten.into_bytes(), original_method)
        }
        Action::Count => {
            let target = render_read_target(cfg, &base_index, &tenant)?;
            let path = rewrite_first_segment(&route_result.path, &target);
            let mut value = parse_json_body(&request.body)?;
            if cfg.mode == Mode::IndexPerTenant {
                value = query_dsl::prefix_query_body(&base_index, value);
            }
            let Value::Object(mut map) = value else {
                return Err(RewriteError::body_shape("_count body must be a JSON object"));
            };
            map.insert("size".to_string(), Value::from(0));
            (path, request.query, body_to_bytes(&Value::Object(map)), original_method)
        }
        Action::Index => {
            let target = render_write_target(cfg, &base_index, &tenant)?;
            let path = rewrite_first_segment(&route_result.path, &target);
            let value = parse_json_body(&request.body)?;
            let value = match cfg.mode {
                Mode::Shared => mapping::inject_tenant_field(value, &cfg.shared_tenant_field, &tenant),
                Mode::IndexPerTenant => mapping::wrap_document(&base_index, value),
            };
            (path, request.query, body_to_bytes(&value), original_method)
        }
        Action::Update => {
            let target = render_write_target(cfg, &base_index, &tenant)?;
            let path = rewrite_first_segment(&route_result.path, &target);
            let value = parse_json_body(&request.body)?;
            let value = match cfg.mode {
                Mode::Shared => {
                    mapping::inject_tenant_field_into_update(value, &cfg.shared_tenant_field, &tenant)
                }
                Mode::IndexPerTenant => mapping::wrap_update_body(&base_index, value),
            };
            (path, request.query, body_to_bytes(&value), original_method)
        }
        Action::UpdateByQuery | Action::DeleteByQuery => {
            let target = render_read_target(cfg, &base_index, &tenant)?;
            let path = rewrite_first_segment(&route_result.path, &target);
            let body = match cfg.mode {
                Mode::Shared => request.body,
                Mode::IndexPerTenant => {
                    let value = parse_json_body(&request.body)?;
                    body_to_bytes(&query_dsl::prefix_query_body(&base_index, value))
                }
            };
            (path, request.query, body, original_method)
        }
        Action::Mapping => {
            let target = render_write_target(cfg, &base_index, &tenant)?;
            let path = rewrite_first_segment(&route_result.path, &target);
            let body = match cfg.mode {
                Mode::Shared => request.body,
                Mode::IndexPerTenant => {
                    let value = parse_json_body(&request.body)?;
                    body_to_bytes(&mapping::wrap_mapping(&base_index, value))
                }
            };
            (path, request.query, body, original_method)
        }
        Action::CreateIndex | Action::DeleteIndex | Action::IndexScopedPassthrough => {
            let target = render_write_target(cfg, &base_index, &tenant)?;
            let path = rewrite_first_segment(&route_result.path, &target);
            (path, request.query, request.body, original_method)
        }
        Action::Bulk => {
            let body_str = std::str::from_utf8(&request.body)
                .map_err(|e| RewriteError::body_parse(format!("bulk body is not valid UTF-8: {e}")))?;
            let rewritten = bulk::rewrite_bulk(
                cfg.mode,
                &cfg.tenant_regex,
                &cfg.shared_tenant_field,
                Some(&tenant),
                &base_index,
                &cfg.shared_index_name,
                &cfg.index_per_tenant_template,
                body_str,
            )?;
            let target = render_write_target(cfg, &base_index, &tenant)?;
            let path = rewrite_first_segment(&route_result.path, &target);
            (path, request.query, rewritten.into_bytes(), original_method)
        }
        Action::Get => {
            let id = route_result
                .doc_id
                .as_deref()
                .ok_or_else(|| RewriteError::body_shape("_get requires a document id"))?;
            let body = synth::synth_get_by_id(id)?;
            let target = render_read_target(cfg, &base_index, &tenant)?;
            (format!("/{target}/_search"), request.query, body_to_bytes(&body), Method::Post)
        }
        Action::Source => match route_result.doc_id.as_deref() {
            Some(id) => {
                let body = synth::synth_get_by_id(id)?;
                let target = render_read_target(cfg, &base_index, &tenant)?;
                (format!("/{target}/_search"), request.query, body_to_bytes(&body), Method::Post)
            }
            None => {
                let target = render_read_target(cfg, &base_index, &tenant)?;
                let body = rewrite_search_body(cfg, &base_index, request.body)?;
                (format!("/{target}/_search"), request.query, body, original_method)
            }
        },
        Action::DeleteById => {
            let id = route_result
                .doc_id
                .as_deref()
                .ok_or_else(|| RewriteError::body_shape("_delete requires a document id"))?;
            let body = synth::synth_delete_by_id(id)?;
            let target = render_read_target(cfg, &base_index, &tenant)?;
            (format!("/{target}/_delete_by_query"), request.query, body_to_bytes(&body), Method::Post)
        }
        Action::Mget => {
            let value = parse_json_body(&request.body)?;
            let expected_logical_index = format!("{base_index}-{tenant}");
            let body = synth::synth_mget(&value, &expected_logical_index)?;
            let target = render_read_target(cfg, &base_index, &tenant)?;
            (format!("/{target}/_search"), request.query, body_to_bytes(&body), Method::Post)
        }
        Action::CatIndices | Action::Transform | Action::Rollup => {
            return Err(RewriteError::Classification(format!(
                "{:?} is only reachable at the root path",
                route_result.action
            )));
        }
    };

    Ok(RewriteOutcome {
        path,
        query,
        body,
        method,
        tenant,
        passthrough: false,
        response_rewrite_required: matches!(route_result.action, Action::CatIndices),
    })
}
