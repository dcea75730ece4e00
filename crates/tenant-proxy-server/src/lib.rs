//! Tenant Proxy Server
//!
//! The HTTP boundary adapter: CLI/config loading, shared application state,
//! and the axum router that classifies, rewrites, and forwards requests
//! through `tenant-proxy-core`. Exposed as a library (in addition to the
//! `tenant-proxy` binary) so integration tests can drive the router
//! directly with `tower::ServiceExt::oneshot`.

use clap::Parser;

pub mod config;
pub mod proxy;
pub mod routes;
pub mod security;

#[derive(Parser, Debug)]
#[command(name = "tenant-proxy")]
#[command(about = "Multi-tenant search-engine proxy", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "TENANT_PROXY_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Upstream cluster URL override
    #[arg(short, long)]
    pub backend: Option<String>,

    /// Listen address override (host:port)
    #[arg(short, long)]
    pub listen: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
