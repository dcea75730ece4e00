//! Shared application state, built once at startup and cloned (cheaply,
//! via `Arc`) into every request task.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use tenant_proxy_core::config::CompiledConfig;

use crate::config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    /// Ambient transport settings (listen address, body limit, log filter).
    pub config: Arc<ServerConfig>,

    /// Compiled tenancy config: regex, templates, deny patterns.
    pub compiled: Arc<CompiledConfig>,

    /// HTTP client used to forward rewritten requests upstream.
    pub http_client: reqwest::Client,

    /// Prometheus metrics handle for rendering `/metrics`.
    pub metrics_handle: PrometheusHandle,
}

impl AppState {
    pub fn new(config: ServerConfig, metrics_handle: PrometheusHandle) -> anyhow::Result<Self> {
        let compiled = config
            .core
            .compile()
            .map_err(|e| anyhow::anyhow!("failed to compile tenancy config: {}", e))?;

        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(config.upstream_timeout_ms))
            .build()?;

        Ok(Self {
            config: Arc::new(config),
            compiled: Arc::new(compiled),
            http_client,
            metrics_handle,
        })
    }
}
