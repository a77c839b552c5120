//! Health Check and Metrics Endpoint
//!
//! HTTP routes for health checks, cache and upstream status reporting, and
//! Prometheus metrics. Used by container orchestrators, load balancers, and
//! monitoring systems.
//!
//! # Endpoints
//!
//! - `GET /health` - Returns JSON health status
//! - `GET /healthz` - Kubernetes liveness probe (simple OK)
//! - `GET /readyz` - Kubernetes readiness probe (checks upstream history)
//! - `GET /metrics` - Prometheus metrics in text format

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::application::services::ProxyStatsSnapshot;
use crate::domain::outcome::OutcomeKind;
use crate::infrastructure::http::AppState;
use crate::infrastructure::metrics::get_metrics_handle;

// =============================================================================
// Health Response Types
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Overall status: "healthy", "degraded", or "unhealthy".
    pub status: HealthStatus,
    /// Proxy version.
    pub version: String,
    /// Server uptime in seconds.
    pub uptime_secs: u64,
    /// Current time.
    pub current_time: DateTime<Utc>,
    /// Quote cache status.
    pub cache: CacheStatus,
    /// Upstream request status.
    pub upstream: UpstreamStatus,
}

/// Overall health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Last upstream request succeeded, or none has been made yet.
    Healthy,
    /// Last upstream request failed after an earlier success.
    Degraded,
    /// Upstream requests have only ever failed.
    Unhealthy,
}

/// Quote cache status.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatus {
    /// Freshness window in seconds.
    pub ttl_secs: u64,
    /// Whether a fresh quote set is cached.
    pub fresh: bool,
    /// Age of the cached quote set in seconds, when fresh.
    pub age_secs: Option<u64>,
    /// Requests answered from cache.
    pub hits: u64,
    /// Requests not answered from cache.
    pub misses: u64,
}

/// Upstream request status.
#[derive(Debug, Clone, Serialize)]
pub struct UpstreamStatus {
    /// Upstream requests issued.
    pub requests: u64,
    /// Outcome of the most recent request.
    pub last_outcome: Option<OutcomeKind>,
    /// Completion time of the most recent successful request.
    pub last_success_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Routes
// =============================================================================

/// Health and metrics routes, merged into the main router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/healthz", get(liveness_handler))
        .route("/readyz", get(readiness_handler))
        .route("/metrics", get(metrics_handler))
}

// =============================================================================
// HTTP Handlers
// =============================================================================

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let response = build_health_response(&state).await;
    let status_code = match response.status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status_code, Json(response))
}

async fn liveness_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn readiness_handler(State(state): State<AppState>) -> impl IntoResponse {
    let stats = state.proxy.stats().snapshot();

    if determine_health_status(&stats) == HealthStatus::Unhealthy {
        (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
    } else {
        (StatusCode::OK, "READY")
    }
}

async fn metrics_handler() -> impl IntoResponse {
    get_metrics_handle().map_or_else(
        || {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                [("content-type", "text/plain")],
                "Metrics not initialized".to_string(),
            )
        },
        |handle| {
            let body = handle.render();
            (
                StatusCode::OK,
                [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
                body,
            )
        },
    )
}

async fn build_health_response(state: &AppState) -> HealthResponse {
    let stats = state.proxy.stats().snapshot();
    let age = state.proxy.cached_age().await;

    HealthResponse {
        status: determine_health_status(&stats),
        version: state.version.clone(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        current_time: Utc::now(),
        cache: CacheStatus {
            ttl_secs: state.proxy.cache_ttl().as_secs(),
            fresh: age.is_some(),
            age_secs: age.map(|age| age.as_secs()),
            hits: stats.cache_hits,
            misses: stats.cache_misses,
        },
        upstream: UpstreamStatus {
            requests: stats.upstream_calls,
            last_outcome: stats.last_outcome,
            last_success_at: stats.last_success_at,
        },
    }
}

fn determine_health_status(stats: &ProxyStatsSnapshot) -> HealthStatus {
    match (stats.last_outcome, stats.last_success_at) {
        (Some(kind), None) if kind.is_failure() => HealthStatus::Unhealthy,
        (Some(kind), Some(_)) if kind.is_failure() => HealthStatus::Degraded,
        _ => HealthStatus::Healthy,
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::application::ports::MockPriceSource;
    use crate::application::services::{PriceCacheProxy, ProxySettings};
    use crate::infrastructure::cache::InMemoryQuoteCache;
    use crate::infrastructure::http::create_router;

    fn snapshot(last_outcome: Option<OutcomeKind>, succeeded_before: bool) -> ProxyStatsSnapshot {
        ProxyStatsSnapshot {
            cache_hits: 0,
            cache_misses: 0,
            upstream_calls: 0,
            last_outcome,
            last_success_at: succeeded_before.then(Utc::now),
        }
    }

    fn app_with(source: MockPriceSource) -> Router {
        let proxy = PriceCacheProxy::new(
            Arc::new(InMemoryQuoteCache::new()),
            Arc::new(source),
            ProxySettings::new(vec!["bitcoin".to_string()], "usd"),
        );
        create_router(AppState::new(Arc::new(proxy), "1.2.3"))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    #[test]
    fn health_status_serialization() {
        assert_eq!(
            serde_json::to_string(&HealthStatus::Healthy).unwrap(),
            "\"healthy\""
        );
        assert_eq!(
            serde_json::to_string(&HealthStatus::Degraded).unwrap(),
            "\"degraded\""
        );
        assert_eq!(
            serde_json::to_string(&HealthStatus::Unhealthy).unwrap(),
            "\"unhealthy\""
        );
    }

    #[test]
    fn determine_status_before_first_request() {
        assert_eq!(
            determine_health_status(&snapshot(None, false)),
            HealthStatus::Healthy
        );
    }

    #[test]
    fn determine_status_after_success() {
        assert_eq!(
            determine_health_status(&snapshot(Some(OutcomeKind::Success), true)),
            HealthStatus::Healthy
        );
    }

    #[test]
    fn determine_status_failure_after_success() {
        assert_eq!(
            determine_health_status(&snapshot(Some(OutcomeKind::RateLimited), true)),
            HealthStatus::Degraded
        );
    }

    #[test]
    fn determine_status_only_failures() {
        assert_eq!(
            determine_health_status(&snapshot(Some(OutcomeKind::TransportFailure), false)),
            HealthStatus::Unhealthy
        );
    }

    #[tokio::test]
    async fn liveness_is_ok() {
        let (status, body) = get(app_with(MockPriceSource::new()), "/healthz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"OK");
    }

    #[tokio::test]
    async fn health_reports_version_and_cache() {
        let (status, body) = get(app_with(MockPriceSource::new()), "/health").await;
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["version"], "1.2.3");
        assert_eq!(body["cache"]["ttl_secs"], 300);
        assert_eq!(body["cache"]["fresh"], false);
        assert_eq!(body["upstream"]["requests"], 0);
    }

    #[tokio::test]
    async fn readiness_fails_when_upstream_never_succeeded() {
        let mut source = MockPriceSource::new();
        source
            .expect_fetch()
            .returning(|_| Ok(br#"{"error_code":429}"#.to_vec()));
        let app = app_with(source);

        let (status, _) = get(app.clone(), "/api/crypto-prices/").await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

        let (status, body) = get(app.clone(), "/readyz").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, b"NOT READY");

        let (status, body) = get(app, "/health").await;
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["upstream"]["last_outcome"], "rate_limited");
    }

    #[tokio::test]
    async fn readiness_ok_after_success() {
        let mut source = MockPriceSource::new();
        source
            .expect_fetch()
            .times(1)
            .returning(|_| Ok(br#"{"bitcoin":{"usd":100}}"#.to_vec()));
        let app = app_with(source);

        let (status, _) = get(app.clone(), "/api/crypto-prices/").await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = get(app.clone(), "/readyz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"READY");

        let (_, body) = get(app, "/health").await;
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["cache"]["fresh"], true);
        assert_eq!(body["cache"]["misses"], 1);
    }
}
