//! HTTP Controller (Driver Adapter)
//!
//! Axum router exposing the quote set as JSON and as an HTML chart. Both
//! endpoints share one [`PriceCacheProxy`], so they observe the same cache.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};

use super::chart::{render_chart_page, render_error_page};
use super::response::{
    ApiIndexResponse, EndpointLinks, WelcomeResponse, quotes_or_error, status_for,
};
use crate::application::services::PriceCacheProxy;
use crate::infrastructure::health;
use crate::infrastructure::metrics::{self, Endpoint};

const WELCOME_MESSAGE: &str = "Welcome to the Crypto Price Proxy API!";

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Cached quote proxy.
    pub proxy: Arc<PriceCacheProxy>,
    /// Application version.
    pub version: String,
    /// Process start, for uptime reporting.
    pub started_at: Instant,
}

impl AppState {
    /// Create state around a proxy.
    #[must_use]
    pub fn new(proxy: Arc<PriceCacheProxy>, version: impl Into<String>) -> Self {
        Self {
            proxy,
            version: version.into(),
            started_at: Instant::now(),
        }
    }
}

/// Create the HTTP router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(welcome))
        .route("/api", get(api_index))
        .route("/api/", get(api_index))
        .route("/api/crypto-prices", get(crypto_prices))
        .route("/api/crypto-prices/", get(crypto_prices))
        .route("/api/crypto-chart", get(crypto_chart))
        .route("/api/crypto-chart/", get(crypto_chart))
        .merge(health::routes())
        .with_state(state)
}

/// Root endpoint.
async fn welcome(headers: HeaderMap) -> impl IntoResponse {
    let base = base_url(&headers);
    Json(WelcomeResponse {
        message: WELCOME_MESSAGE.to_string(),
        api_root: format!("{base}/api/"),
    })
}

/// API index with absolute links to every endpoint.
async fn api_index(headers: HeaderMap) -> impl IntoResponse {
    let base = base_url(&headers);
    Json(ApiIndexResponse {
        message: WELCOME_MESSAGE.to_string(),
        api_root: format!("{base}/api/"),
        endpoints: EndpointLinks {
            crypto_prices: format!("{base}/api/crypto-prices/"),
            crypto_chart: format!("{base}/api/crypto-chart/"),
            health: format!("{base}/health"),
        },
    })
}

/// Quote set as JSON, or an error body.
async fn crypto_prices(State(state): State<AppState>) -> Response {
    let outcome = state.proxy.get_quotes().await;
    let status = status_for(outcome.kind());
    metrics::record_http_response(Endpoint::CryptoPrices, status.as_u16());

    match quotes_or_error(outcome) {
        Ok(quotes) => (status, Json(quotes)).into_response(),
        Err(error) => (status, Json(error)).into_response(),
    }
}

/// Quote set as an HTML bar chart, or an HTML error page.
async fn crypto_chart(State(state): State<AppState>) -> Response {
    let outcome = state.proxy.get_quotes().await;
    let status = status_for(outcome.kind());
    metrics::record_http_response(Endpoint::CryptoChart, status.as_u16());

    let page = match quotes_or_error(outcome) {
        Ok(quotes) => render_chart_page(&quotes.series(state.proxy.currency())),
        Err(error) => render_error_page(status, &error),
    };
    (status, Html(page)).into_response()
}

/// Scheme and authority the client used to reach us.
fn base_url(headers: &HeaderMap) -> String {
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    let scheme = header_value("x-forwarded-proto").unwrap_or("http");
    let host = header_value("x-forwarded-host")
        .or_else(|| header_value(header::HOST.as_str()))
        .unwrap_or("localhost");
    format!("{scheme}://{host}")
}
