//! Server-level configuration: the core's tenancy config plus the ambient
//! transport settings the core has no opinion about (listen address, body
//! size ceiling, upstream timeout, log filter).

use std::path::Path;

use serde::{Deserialize, Serialize};
use tenant_proxy_core::config::Config as CoreConfig;

use crate::security::{validate_backend_url, UrlValidationConfig};
use crate::Cli;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(flatten)]
    pub core: CoreConfig,

    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    #[serde(default = "default_body_limit_bytes")]
    pub request_body_limit_bytes: usize,

    #[serde(default = "default_upstream_timeout_ms")]
    pub upstream_timeout_ms: u64,

    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_body_limit_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_upstream_timeout_ms() -> u64 {
    30_000
}

fn default_log_filter() -> String {
    "tenant_proxy=info".to_string()
}

impl ServerConfig {
    /// Load configuration from a YAML file, applying CLI and environment
    /// overrides, and validate it (regex/template compilation plus
    /// SSRF-hardening of `upstream_url`).
    pub fn load(config_path: &str, cli: &Cli) -> anyhow::Result<Self> {
        let path = Path::new(config_path);
        let mut config: ServerConfig = if path.exists() {
            let content = std::fs::read_to_string(path)
                .map_err(|e| anyhow::anyhow!("failed to read config file '{}': {}", config_path, e))?;
            serde_yaml::from_str(&content)
                .map_err(|e| anyhow::anyhow!("failed to parse config file '{}': {}", config_path, e))?
        } else {
            anyhow::bail!("config file '{}' does not exist", config_path);
        };

        if let Ok(upstream) = std::env::var("TENANT_PROXY_UPSTREAM_URL") {
            config.core.upstream_url = upstream;
        }
        if let Ok(listen) = std::env::var("TENANT_PROXY_LISTEN") {
            config.listen_addr = listen;
        }
        if let Ok(log_filter) = std::env::var("TENANT_PROXY_LOG") {
            config.log_filter = log_filter;
        }

        if let Some(backend) = &cli.backend {
            config.core.upstream_url = backend.clone();
        }
        if let Some(listen) = &cli.listen {
            config.listen_addr = listen.clone();
        }

        let url_config = if std::env::var("TENANT_PROXY_DEV_MODE").is_ok() {
            UrlValidationConfig::development()
        } else {
            UrlValidationConfig::default()
        };
        validate_backend_url(&config.core.upstream_url, &url_config)
            .map_err(|e| anyhow::anyhow!("invalid upstream_url: {}", e))?;

        config.core.compile().map_err(|e| anyhow::anyhow!("invalid configuration: {}", e))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &tempfile::TempDir, contents: &str) -> String {
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, contents).unwrap();
        path.to_str().unwrap().to_string()
    }

    fn no_overrides() -> Cli {
        Cli {
            config: "config.yaml".to_string(),
            backend: None,
            listen: None,
            verbose: false,
        }
    }

    #[test]
    fn loads_a_valid_shared_mode_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
upstream_url: "https://search.internal:9200"
mode: shared
tenant_regex: "^(?P<prefix>/?[^-]+)-(?P<tenant>[^-/]+)(?P<postfix>.*)$"
passthrough_paths: ["/_cluster/health"]
shared_index:
  name: shared-index
  alias_template: "{index}-{tenant}"
  tenant_field: tenant_id
  deny_patterns: ["^shared-index$"]
index_per_tenant:
  index_template: ""
"#,
        );
        let config = ServerConfig::load(&path, &no_overrides()).unwrap();
        assert_eq!(config.core.upstream_url, "https://search.internal:9200");
        assert_eq!(config.listen_addr, default_listen_addr());
    }

    #[test]
    fn rejects_missing_config_file() {
        let result = ServerConfig::load("/nonexistent/config.yaml", &no_overrides());
        assert!(result.is_err());
    }
}
