//! HTTP routes and handlers
//!
//! Every upstream endpoint (unlike the teacher's fixed `/v1/chat/completions`
//! route) must be considered, so the proxy is a single fallback handler: read
//! the body, classify+rewrite with the core, forward upstream, stream the
//! response back.

use std::collections::BTreeMap;
use std::str::FromStr;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use futures_util::stream::StreamExt;
use serde_json::json;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{debug, error, warn};

use tenant_proxy_core::{Method, Request, RewriteError};

use crate::proxy::AppState;

pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.request_body_limit_bytes;
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .fallback(proxy_handler)
        .layer(RequestBodyLimitLayer::new(body_limit))
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

async fn metrics(State(state): State<AppState>) -> String {
    state.metrics_handle.render()
}

/// Hop-by-hop headers that must not be forwarded verbatim between the
/// client and the upstream cluster.
const HOP_BY_HOP_HEADERS: &[&str] = &["host", "content-length", "connection", "transfer-encoding"];

async fn proxy_handler(
    State(state): State<AppState>,
    method: axum::http::Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    metrics::counter!("tenant_proxy_requests_total").increment(1);
    let start = std::time::Instant::now();

    let core_method = Method::from_str(method.as_str())
        .map_err(|_| AppError::Rewrite(RewriteError::Classification(format!("unsupported HTTP method '{}'", method))))?;

    let mut request = Request::new(core_method, uri.path().to_string()).with_body(body.to_vec());
    for (key, value) in parse_query(uri.query()) {
        request = request.with_query(key, value);
    }

    let outcome = tenant_proxy_core::rewrite_request(&state.compiled, request).map_err(|e| {
        metrics::counter!("tenant_proxy_rewrite_errors_total", "code" => e.code()).increment(1);
        AppError::Rewrite(e)
    })?;

    metrics::histogram!("tenant_proxy_rewrite_latency_us").record(start.elapsed().as_micros() as f64);

    let target_url = build_upstream_url(&state.compiled.upstream_url, &outcome.path, &outcome.query);
    debug!("forwarding {} {}", outcome.method.as_str(), target_url);

    let mut upstream_req = state
        .http_client
        .request(reqwest::Method::from_bytes(outcome.method.as_str().as_bytes()).unwrap(), &target_url)
        .body(outcome.body);

    for (name, value) in headers.iter() {
        if HOP_BY_HOP_HEADERS.contains(&name.as_str().to_ascii_lowercase().as_str()) {
            continue;
        }
        upstream_req = upstream_req.header(name, value);
    }
    if !outcome.passthrough && !outcome.tenant.is_empty() {
        upstream_req = upstream_req.header("X-ES-Tenant", &outcome.tenant);
    }

    let upstream_response = upstream_req.send().await.map_err(AppError::Upstream)?;
    let status = upstream_response.status();
    let response_headers = upstream_response.headers().clone();

    if outcome.response_rewrite_required {
        let body_text = upstream_response.text().await.map_err(AppError::Upstream)?;
        let rewritten = rewrite_response_body(&state.compiled.tenant_regex, &body_text);
        let mut response = (StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::OK), rewritten).into_response();
        copy_response_headers(&response_headers, response.headers_mut());
        return Ok(response);
    }

    let stream = upstream_response.bytes_stream().map(|chunk| {
        chunk.map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    });
    let mut response = Response::new(axum::body::Body::from_stream(stream));
    *response.status_mut() = StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::OK);
    copy_response_headers(&response_headers, response.headers_mut());

    Ok(response)
}

fn copy_response_headers(src: &reqwest::header::HeaderMap, dst: &mut HeaderMap) {
    for (name, value) in src.iter() {
        if HOP_BY_HOP_HEADERS.contains(&name.as_str().to_ascii_lowercase().as_str()) {
            continue;
        }
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_str().as_bytes()),
            HeaderValue::from_bytes(value.as_bytes()),
        ) {
            dst.insert(name, value);
        }
    }
}

fn rewrite_response_body(tenant_regex: &regex::Regex, body: &str) -> String {
    let trimmed = body.trim_start();
    if trimmed.starts_with('[') {
        tenant_proxy_core::response::rewrite_cat_indices_json(tenant_regex, body)
    } else {
        tenant_proxy_core::response::rewrite_cat_indices_text(tenant_regex, body)
    }
}

fn parse_query(raw: Option<&str>) -> BTreeMap<String, String> {
    match raw {
        Some(raw) => url::form_urlencoded::parse(raw.as_bytes()).into_owned().collect(),
        None => BTreeMap::new(),
    }
}

fn build_upstream_url(upstream_base: &str, path: &str, query: &BTreeMap<String, String>) -> String {
    let mut url = format!("{}{}", upstream_base.trim_end_matches('/'), path);
    if !query.is_empty() {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in query {
            serializer.append_pair(key, value);
        }
        url.push('?');
        url.push_str(&serializer.finish());
    }
    url
}

/// Error handling: every `RewriteError` becomes HTTP 400; upstream transport
/// failures become HTTP 502, mirroring the teacher's `AppError::BackendError`.
#[derive(Debug)]
enum AppError {
    Rewrite(RewriteError),
    Upstream(reqwest::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Rewrite(e) => {
                warn!("rejected request: {}", e);
                let body = json!({"error": e.code(), "message": e.to_string()});
                (StatusCode::BAD_REQUEST, axum::Json(body)).into_response()
            }
            AppError::Upstream(e) => {
                error!("upstream request failed: {}", e);
                let body = json!({"error": "upstream_error", "message": e.to_string()});
                (StatusCode::BAD_GATEWAY, axum::Json(body)).into_response()
            }
        }
    }
}
