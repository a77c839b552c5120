//! Crypto Price Proxy Binary
//!
//! Starts the cached price proxy.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin crypto-price-proxy
//! ```
//!
//! # Environment Variables
//!
//! All optional.
//! - `PRICE_PROXY_HTTP_PORT`: HTTP port (default: 8000)
//! - `PRICE_PROXY_UPSTREAM_URL`: Simple-price endpoint (default: CoinGecko public API)
//! - `PRICE_PROXY_ASSET_IDS`: Comma-separated asset ids (default: ten major coins)
//! - `PRICE_PROXY_VS_CURRENCY`: Quote currency (default: usd)
//! - `PRICE_PROXY_UPSTREAM_TIMEOUT_SECS`: Upstream timeout (default: 5)
//! - `PRICE_PROXY_CACHE_TTL_SECS`: Cache freshness window (default: 300)
//! - `COINGECKO_API_KEY`: CoinGecko demo API key
//! - `OTEL_ENABLED`: Enable OpenTelemetry span export (default: false)
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (default: <http://localhost:4317>)
//! - `OTEL_SERVICE_NAME`: Service name (default: crypto-price-proxy)
//! - `RUST_LOG`: Log filter

use std::sync::Arc;

use anyhow::Context;
use crypto_price_proxy::infrastructure::telemetry;
use crypto_price_proxy::{
    AppState, CoinGeckoClient, HttpServer, InMemoryQuoteCache, PriceCacheProxy, ProxyConfig,
    init_metrics,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    // Initialize telemetry (tracing + optional OpenTelemetry)
    let _telemetry_guard = telemetry::init();

    tracing::info!("Starting Crypto Price Proxy");

    // Initialize Prometheus metrics
    let _metrics_handle = init_metrics();

    let config = ProxyConfig::from_env().context("invalid configuration")?;
    log_config(&config);

    let source = CoinGeckoClient::new(&config.upstream).context("failed to build HTTP client")?;
    let proxy = Arc::new(PriceCacheProxy::new(
        Arc::new(InMemoryQuoteCache::new()),
        Arc::new(source),
        config.quotes.proxy_settings(),
    ));

    let shutdown_token = CancellationToken::new();
    let state = AppState::new(proxy, env!("CARGO_PKG_VERSION"));
    let server = HttpServer::new(config.server.http_port, state, shutdown_token.clone());

    let mut server_handle = tokio::spawn(server.run());

    tracing::info!("Price proxy ready");

    tokio::select! {
        result = &mut server_handle => {
            // The server only returns on its own when it fails, e.g. the port is taken.
            result.context("HTTP server task panicked")??;
        }
        () = await_shutdown(shutdown_token) => {
            server_handle.await.context("HTTP server task panicked")??;
        }
    }

    tracing::info!("Price proxy stopped");
    Ok(())
}

/// Log the parsed configuration.
fn log_config(config: &ProxyConfig) {
    tracing::info!(
        http_port = config.server.http_port,
        assets = config.quotes.asset_ids.len(),
        vs_currency = %config.quotes.vs_currency,
        cache_ttl_secs = config.quotes.cache_ttl.as_secs(),
        "Configuration loaded"
    );
    tracing::debug!(
        upstream_url = %config.upstream.url,
        timeout_secs = config.upstream.timeout.as_secs(),
        api_key = config.upstream.api_key.is_some(),
        "Upstream endpoint"
    );
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT), then cancel the token.
#[allow(clippy::expect_used)]
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    shutdown_token.cancel();
}
