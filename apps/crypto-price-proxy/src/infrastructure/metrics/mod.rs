//! Prometheus Metrics Module
//!
//! Exposes application metrics via Prometheus format for monitoring.
//!
//! # Metrics Categories
//!
//! - **Cache**: hits and misses on the quote cache
//! - **Upstream**: requests by outcome and their latency
//! - **HTTP**: responses served by endpoint and status
//!
//! # Integration
//!
//! Metrics are exposed at `/metrics` on the HTTP server port. Recording
//! functions are no-ops until [`init_metrics`] installs the recorder.

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::domain::outcome::OutcomeKind;

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// # Panics
///
/// Panics if the recorder cannot be installed.
#[allow(clippy::expect_used)]
pub fn init_metrics() -> PrometheusHandle {
    PROMETHEUS_HANDLE
        .get_or_init(|| {
            let builder = PrometheusBuilder::new();
            let handle = builder
                .install_recorder()
                .expect("failed to install Prometheus recorder");

            register_metrics();
            handle
        })
        .clone()
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    describe_counter!(
        "price_proxy_cache_hits_total",
        "Quote requests answered from cache"
    );
    describe_counter!(
        "price_proxy_cache_misses_total",
        "Quote requests that went upstream"
    );
    describe_counter!(
        "price_proxy_upstream_requests_total",
        "Upstream price requests by outcome"
    );
    describe_histogram!(
        "price_proxy_upstream_request_seconds",
        "Upstream price request latency"
    );
    describe_counter!(
        "price_proxy_http_responses_total",
        "HTTP responses served by endpoint and status"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Metric labels for served endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// JSON quote endpoint.
    CryptoPrices,
    /// HTML chart endpoint.
    CryptoChart,
}

impl Endpoint {
    const fn as_str(self) -> &'static str {
        match self {
            Self::CryptoPrices => "crypto_prices",
            Self::CryptoChart => "crypto_chart",
        }
    }
}

/// Record a cache hit.
pub fn record_cache_hit() {
    counter!("price_proxy_cache_hits_total").increment(1);
}

/// Record a cache miss.
pub fn record_cache_miss() {
    counter!("price_proxy_cache_misses_total").increment(1);
}

/// Record one upstream request and how long it took.
pub fn record_upstream_request(outcome: OutcomeKind, duration: Duration) {
    counter!(
        "price_proxy_upstream_requests_total",
        "outcome" => outcome.as_str()
    )
    .increment(1);
    histogram!(
        "price_proxy_upstream_request_seconds",
        "outcome" => outcome.as_str()
    )
    .record(duration.as_secs_f64());
}

/// Record an HTTP response.
pub fn record_http_response(endpoint: Endpoint, status: u16) {
    counter!(
        "price_proxy_http_responses_total",
        "endpoint" => endpoint.as_str(),
        "status" => status.to_string()
    )
    .increment(1);
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_as_str() {
        assert_eq!(Endpoint::CryptoPrices.as_str(), "crypto_prices");
        assert_eq!(Endpoint::CryptoChart.as_str(), "crypto_chart");
    }

    #[test]
    fn recording_without_recorder_is_noop() {
        record_cache_hit();
        record_cache_miss();
        record_upstream_request(OutcomeKind::RateLimited, Duration::from_millis(12));
        record_http_response(Endpoint::CryptoPrices, 429);
    }
}
