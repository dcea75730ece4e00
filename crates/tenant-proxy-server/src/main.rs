//! Tenant Proxy
//!
//! HTTP boundary adapter for the multi-tenant search-engine proxy: parses
//! configuration, builds shared state, and serves the classify-rewrite-
//! forward pipeline implemented in `tenant-proxy-core`.

use anyhow::Result;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{info, warn};

use tenant_proxy_server::{config::ServerConfig, proxy, routes, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ServerConfig::load(&cli.config, &cli)?;
    init_tracing(&config.log_filter, cli.verbose);

    info!("Starting tenant proxy");
    info!("Upstream: {}", config.core.upstream_url);
    info!("Mode: {:?}", config.core.mode);

    let metrics_handle = init_metrics()?;

    let listen_addr = config.listen_addr.clone();
    let state = proxy::AppState::new(config, metrics_handle)?;

    let addr: SocketAddr = listen_addr.parse()?;
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    let shutdown = async {
        shutdown_signal().await;
        warn!("Shutdown signal received, stopping server...");
    };

    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

fn init_tracing(log_filter: &str, verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let default_filter = if verbose {
        "tenant_proxy=debug,tower_http=debug"
    } else {
        log_filter
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_metrics() -> Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("failed to install metrics: {}", e))?;

    metrics::describe_counter!("tenant_proxy_requests_total", "Total number of requests processed");
    metrics::describe_counter!(
        "tenant_proxy_rewrite_errors_total",
        "Total number of rewrite errors by stable error code"
    );
    metrics::describe_histogram!(
        "tenant_proxy_rewrite_latency_us",
        metrics::Unit::Microseconds,
        "Request classification and rewriting latency in microseconds"
    );

    info!("Metrics exporter initialized");
    Ok(handle)
}
