//! Price Cache Proxy
//!
//! Serves the configured quote set, consulting a short-lived cache before
//! calling the upstream price source.
//!
//! # Per-call state machine
//!
//! ```text
//! Start ─► CacheCheck ─┬─ hit ──────────────────────────► Success
//!                      └─ miss ─► Fetching ─┬─ ok ──────► Success (cache written)
//!                                           ├─ limited ─► RateLimited
//!                                           ├─ garbage ─► MalformedPayload
//!                                           └─ error ───► TransportFailure
//! ```
//!
//! Only `Success` writes the cache. There are no retries.
//!
//! # Concurrency
//!
//! Misses are single-flight. The first caller to miss starts a flight and
//! every caller that misses while it is in the air joins it, receiving the
//! same outcome, failures included. A burst of concurrent misses costs one
//! upstream call and each caller waits at most one upstream timeout.
//!
//! If the caller running the flight is cancelled, one of the joined callers
//! takes the fetch over. A failed flight is forgotten once it lands, so the
//! next miss goes upstream again.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::sync::OnceCell;
use tokio::time::Instant;

use crate::application::ports::{PriceSource, QuoteCache, QuoteRequest};
use crate::domain::outcome::{FetchOutcome, OutcomeKind, classify_payload};
use crate::domain::quotes::CurrencyCode;
use crate::infrastructure::metrics;

/// Cache key the quote set is stored under.
pub const CACHE_KEY: &str = "crypto_prices";

/// Default freshness window for cached quotes.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

// =============================================================================
// Proxy Statistics
// =============================================================================

/// Counters describing how the proxy has been serving requests.
#[derive(Debug, Default)]
pub struct ProxyStats {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    upstream_calls: AtomicU64,
    last_outcome: RwLock<Option<OutcomeKind>>,
    last_success_at: RwLock<Option<DateTime<Utc>>>,
}

impl ProxyStats {
    fn record_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    fn record_upstream(&self, kind: OutcomeKind) {
        self.upstream_calls.fetch_add(1, Ordering::Relaxed);
        *self.last_outcome.write() = Some(kind);
        if kind == OutcomeKind::Success {
            *self.last_success_at.write() = Some(Utc::now());
        }
    }

    /// Take a consistent-enough copy for reporting.
    #[must_use]
    pub fn snapshot(&self) -> ProxyStatsSnapshot {
        ProxyStatsSnapshot {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            upstream_calls: self.upstream_calls.load(Ordering::Relaxed),
            last_outcome: *self.last_outcome.read(),
            last_success_at: *self.last_success_at.read(),
        }
    }
}

/// Point-in-time copy of [`ProxyStats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProxyStatsSnapshot {
    /// Calls answered from cache.
    pub cache_hits: u64,
    /// Calls that found no fresh entry.
    pub cache_misses: u64,
    /// Upstream requests issued.
    pub upstream_calls: u64,
    /// Outcome of the most recent upstream request.
    pub last_outcome: Option<OutcomeKind>,
    /// When the most recent successful upstream request completed.
    pub last_success_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Price Cache Proxy
// =============================================================================

/// What to fetch and how long to keep it.
#[derive(Debug, Clone)]
pub struct ProxySettings {
    /// Upstream request (asset ids and currency).
    pub request: QuoteRequest,
    /// Currency every asset must be priced in.
    pub currency: CurrencyCode,
    /// Cache freshness window.
    pub cache_ttl: Duration,
}

impl ProxySettings {
    /// Settings for `ids` priced in `currency`, with the default TTL.
    #[must_use]
    pub fn new(ids: Vec<String>, currency: impl Into<CurrencyCode>) -> Self {
        let currency = currency.into();
        Self {
            request: QuoteRequest::new(ids, currency.clone()),
            currency,
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }

    /// Override the cache TTL.
    #[must_use]
    pub const fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }
}

/// One upstream fetch, shared by every caller that missed while it ran.
type Flight = Arc<OnceCell<FetchOutcome>>;

/// Cached proxy in front of the upstream price source.
pub struct PriceCacheProxy {
    cache: Arc<dyn QuoteCache>,
    source: Arc<dyn PriceSource>,
    settings: ProxySettings,
    inflight: Mutex<Option<Flight>>,
    stats: ProxyStats,
}

impl PriceCacheProxy {
    /// Create a proxy over the given cache and source.
    #[must_use]
    pub fn new(
        cache: Arc<dyn QuoteCache>,
        source: Arc<dyn PriceSource>,
        settings: ProxySettings,
    ) -> Self {
        Self {
            cache,
            source,
            settings,
            inflight: Mutex::new(None),
            stats: ProxyStats::default(),
        }
    }

    /// Currency quotes are served in.
    #[must_use]
    pub fn currency(&self) -> &str {
        &self.settings.currency
    }

    /// Cache freshness window.
    #[must_use]
    pub const fn cache_ttl(&self) -> Duration {
        self.settings.cache_ttl
    }

    /// Serving statistics.
    #[must_use]
    pub const fn stats(&self) -> &ProxyStats {
        &self.stats
    }

    /// Age of the live cache entry, if any.
    pub async fn cached_age(&self) -> Option<Duration> {
        self.cache.get(CACHE_KEY).await.map(|entry| entry.age())
    }

    /// Return the quote set, from cache when fresh.
    ///
    /// Makes at most one upstream call, shared with concurrent misses.
    /// Never panics or errors: every failure is reported as a
    /// [`FetchOutcome`] variant.
    #[tracing::instrument(skip(self), fields(key = CACHE_KEY))]
    pub async fn get_quotes(&self) -> FetchOutcome {
        if let Some(outcome) = self.lookup().await {
            return outcome;
        }

        self.stats.record_miss();
        metrics::record_cache_miss();

        let flight = self.join_flight();
        let outcome = flight.get_or_init(|| self.refresh()).await.clone();
        self.land_flight(&flight);
        outcome
    }

    /// The flight in the air, or a new one.
    fn join_flight(&self) -> Flight {
        let mut inflight = self.inflight.lock();
        match inflight.as_ref() {
            Some(flight) if !flight.initialized() => Arc::clone(flight),
            _ => {
                let flight = Flight::default();
                *inflight = Some(Arc::clone(&flight));
                flight
            }
        }
    }

    fn land_flight(&self, flight: &Flight) {
        let mut inflight = self.inflight.lock();
        if inflight
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, flight))
        {
            *inflight = None;
        }
    }

    async fn refresh(&self) -> FetchOutcome {
        // The previous flight may have landed between our miss and now.
        if let Some(entry) = self.cache.get(CACHE_KEY).await {
            return FetchOutcome::Success(entry.data);
        }

        let outcome = self.fetch_upstream().await;
        if let FetchOutcome::Success(quotes) = &outcome {
            self.cache
                .set(CACHE_KEY, quotes.clone(), self.settings.cache_ttl)
                .await;
            tracing::debug!(
                assets = quotes.len(),
                ttl_secs = self.settings.cache_ttl.as_secs(),
                "Quote cache refreshed"
            );
        }
        outcome
    }

    async fn lookup(&self) -> Option<FetchOutcome> {
        let entry = self.cache.get(CACHE_KEY).await?;
        self.stats.record_hit();
        metrics::record_cache_hit();
        tracing::trace!(age_ms = entry.age().as_millis(), "Quote cache hit");
        Some(FetchOutcome::Success(entry.data))
    }

    async fn fetch_upstream(&self) -> FetchOutcome {
        let started = Instant::now();
        let result = self.source.fetch(&self.settings.request).await;
        let elapsed = started.elapsed();

        let outcome = match result {
            Ok(body) => classify_payload(&body, &self.settings.currency),
            Err(e) => FetchOutcome::TransportFailure(e.to_string()),
        };

        let kind = outcome.kind();
        self.stats.record_upstream(kind);
        metrics::record_upstream_request(kind, elapsed);

        match &outcome {
            FetchOutcome::Success(quotes) => {
                tracing::info!(
                    assets = quotes.len(),
                    elapsed_ms = elapsed.as_millis(),
                    "Fetched quotes from upstream"
                );
            }
            FetchOutcome::RateLimited => {
                tracing::warn!(elapsed_ms = elapsed.as_millis(), "Upstream rate limit hit");
            }
            FetchOutcome::TransportFailure(details) => {
                tracing::warn!(error = %details, elapsed_ms = elapsed.as_millis(), "Upstream request failed");
            }
            FetchOutcome::MalformedPayload(details) => {
                tracing::error!(error = %details, "Upstream returned unusable payload");
            }
        }

        outcome
    }
}

// =============================================================================
// Tests
// =============================================================================
