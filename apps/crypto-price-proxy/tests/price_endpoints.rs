//! End-to-end tests for the price endpoints.
//!
//! Runs the real router, proxy, cache and CoinGecko client against a
//! wiremock upstream.

// Allow unwrap in tests - tests should panic on unexpected errors
#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crypto_price_proxy::{
    AppState, CoinGeckoClient, HttpServer, InMemoryQuoteCache, PriceCacheProxy, ProxySettings,
    UpstreamSettings, create_router,
};

const PRICE_PATH: &str = "/api/v3/simple/price";

// =============================================================================
// Helpers
// =============================================================================

struct Harness {
    upstream: MockServer,
    state: AppState,
}

impl Harness {
    async fn start(ids: &[&str], cache_ttl: Duration, timeout: Duration) -> Self {
        let upstream = MockServer::start().await;
        let client = CoinGeckoClient::new(&UpstreamSettings {
            url: format!("{}{PRICE_PATH}", upstream.uri()),
            timeout,
            api_key: None,
        })
        .unwrap();

        let settings = ProxySettings::new(ids.iter().map(ToString::to_string).collect(), "usd")
            .with_cache_ttl(cache_ttl);
        let proxy = PriceCacheProxy::new(
            Arc::new(InMemoryQuoteCache::new()),
            Arc::new(client),
            settings,
        );

        Self {
            upstream,
            state: AppState::new(Arc::new(proxy), "test"),
        }
    }

    fn app(&self) -> Router {
        create_router(self.state.clone())
    }

    async fn mount_body(&self, status: u16, body: &str) {
        Mock::given(method("GET"))
            .and(path(PRICE_PATH))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&self.upstream)
            .await;
    }

    async fn upstream_calls(&self) -> usize {
        self.upstream
            .received_requests()
            .await
            .map_or(0, |requests| requests.len())
    }
}

async fn get(app: Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

fn parse(body: &str) -> serde_json::Value {
    serde_json::from_str(body).unwrap()
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn cache_then_rate_limit_after_expiry() {
    let harness = Harness::start(
        &["bitcoin"],
        Duration::from_millis(300),
        Duration::from_secs(5),
    )
    .await;
    harness.mount_body(200, r#"{"bitcoin":{"usd":100}}"#).await;

    // Empty cache: one upstream call.
    let (status, body) = get(harness.app(), "/api/crypto-prices/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"bitcoin":{"usd":100}}"#);
    assert_eq!(harness.upstream_calls().await, 1);

    // Immediate repeat: served from cache.
    let (status, second) = get(harness.app(), "/api/crypto-prices/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second, body);
    assert_eq!(harness.upstream_calls().await, 1);

    // After expiry the upstream reports quota exhaustion.
    tokio::time::sleep(Duration::from_millis(400)).await;
    harness.upstream.reset().await;
    harness.mount_body(200, r#"{"error_code":429}"#).await;

    let (status, body) = get(harness.app(), "/api/crypto-prices/").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        parse(&body),
        json!({"error": "Rate limit exceeded. Please try again later."})
    );
    assert_eq!(harness.upstream_calls().await, 1);
}

#[tokio::test]
async fn upstream_order_is_preserved() {
    let harness = Harness::start(
        &["bitcoin", "litecoin", "ethereum"],
        Duration::from_secs(300),
        Duration::from_secs(5),
    )
    .await;
    harness
        .mount_body(
            200,
            r#"{"litecoin":{"usd":70.5},"bitcoin":{"usd":64000},"ethereum":{"usd":3100.25}}"#,
        )
        .await;

    let (status, body) = get(harness.app(), "/api/crypto-prices/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        r#"{"litecoin":{"usd":70.5},"bitcoin":{"usd":64000},"ethereum":{"usd":3100.25}}"#
    );

    let (status, html) = get(harness.app(), "/api/crypto-chart/").await;
    assert_eq!(status, StatusCode::OK);
    let positions: Vec<usize> = ["litecoin", "bitcoin", "ethereum"]
        .iter()
        .map(|id| html.find(&format!("data-asset=\"{id}\"")).unwrap())
        .collect();
    assert!(positions[0] < positions[1] && positions[1] < positions[2]);

    // Both endpoints were answered by one upstream call.
    assert_eq!(harness.upstream_calls().await, 1);
}

#[tokio::test]
async fn query_carries_configured_ids() {
    let harness = Harness::start(
        &["bitcoin", "shiba-inu"],
        Duration::from_secs(300),
        Duration::from_secs(5),
    )
    .await;
    Mock::given(method("GET"))
        .and(path(PRICE_PATH))
        .and(query_param("ids", "bitcoin,shiba-inu"))
        .and(query_param("vs_currencies", "usd"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"bitcoin":{"usd":1},"shiba-inu":{"usd":0.00001}}"#),
        )
        .expect(1)
        .mount(&harness.upstream)
        .await;

    let (status, _) = get(harness.app(), "/api/crypto-prices").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn slow_upstream_is_a_transport_failure() {
    let harness = Harness::start(
        &["bitcoin"],
        Duration::from_secs(300),
        Duration::from_millis(200),
    )
    .await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"bitcoin":{"usd":100}}"#)
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&harness.upstream)
        .await;

    let (status, body) = get(harness.app(), "/api/crypto-prices/").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let body = parse(&body);
    assert_eq!(body["error"], "Failed to fetch crypto prices.");
    assert_eq!(body["details"], "request timed out after 0.2s");
}

#[tokio::test]
async fn upstream_server_error_is_a_transport_failure() {
    let harness = Harness::start(
        &["bitcoin"],
        Duration::from_secs(300),
        Duration::from_secs(5),
    )
    .await;
    harness.mount_body(500, "internal error").await;

    let (status, body) = get(harness.app(), "/api/crypto-prices/").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let details = parse(&body)["details"].as_str().unwrap().to_string();
    assert!(details.contains("HTTP 500"));
}

#[tokio::test]
async fn failures_are_not_cached() {
    let harness = Harness::start(
        &["bitcoin"],
        Duration::from_secs(300),
        Duration::from_secs(5),
    )
    .await;
    harness.mount_body(200, r#"{"status":{"error_code":429}}"#).await;

    let (status, _) = get(harness.app(), "/api/crypto-chart/").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    harness.upstream.reset().await;
    harness.mount_body(200, r#"{"bitcoin":{"usd":100}}"#).await;

    let (status, html) = get(harness.app(), "/api/crypto-chart/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("<title>bitcoin: 100.00</title>"));
}

#[tokio::test]
async fn serves_over_tcp_until_cancelled() {
    let harness = Harness::start(
        &["bitcoin"],
        Duration::from_secs(300),
        Duration::from_secs(5),
    )
    .await;
    harness.mount_body(200, r#"{"bitcoin":{"usd":100}}"#).await;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let cancel = CancellationToken::new();
    let server = HttpServer::new(addr.port(), harness.state.clone(), cancel.clone());
    let handle = tokio::spawn(server.serve(listener));

    let response = reqwest::get(format!("http://{addr}/api/crypto-prices/"))
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, json!({"bitcoin": {"usd": 100}}));

    let index: serde_json::Value = reqwest::get(format!("http://{addr}/api/"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        index["endpoints"]["Crypto Chart"],
        format!("http://{addr}/api/crypto-chart/")
    );

    cancel.cancel();
    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_ok());
}
