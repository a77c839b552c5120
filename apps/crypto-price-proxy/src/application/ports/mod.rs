//! Port Interfaces
//!
//! Defines the interfaces (ports) the proxy depends on, following the
//! Hexagonal Architecture pattern. Infrastructure adapters implement them;
//! tests substitute mocks.
//!
//! ## Driven Ports (Outbound)
//!
//! - `QuoteCache`: short-lived storage for the last good quote set
//! - `PriceSource`: the upstream price API

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::domain::quotes::{AssetId, CurrencyCode, PriceQuoteSet};

// =============================================================================
// Cache Port
// =============================================================================

/// A cached quote set with its creation time and time-to-live.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Cached quotes.
    pub data: PriceQuoteSet,
    /// When the entry was written.
    pub created_at: Instant,
    /// How long the entry stays fresh.
    pub ttl: Duration,
}

impl CacheEntry {
    /// Create an entry stamped with the current instant.
    #[must_use]
    pub fn new(data: PriceQuoteSet, ttl: Duration) -> Self {
        Self {
            data,
            created_at: Instant::now(),
            ttl,
        }
    }

    /// Age of the entry.
    #[must_use]
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Whether the entry is still fresh at `now`.
    #[must_use]
    pub fn is_fresh_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) < self.ttl
    }

    /// Whether the entry is still fresh.
    #[must_use]
    pub fn is_fresh(&self) -> bool {
        self.is_fresh_at(Instant::now())
    }
}

/// Key/value cache for quote sets.
///
/// Implementations must never return an expired entry from `get`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuoteCache: Send + Sync {
    /// Fetch the live entry stored under `key`.
    async fn get(&self, key: &str) -> Option<CacheEntry>;

    /// Store `value` under `key`, replacing any previous entry.
    async fn set(&self, key: &str, value: PriceQuoteSet, ttl: Duration);
}

// =============================================================================
// Price Source Port
// =============================================================================

/// The assets and currencies to ask the upstream source for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRequest {
    /// Asset identifiers, in the order they should be requested.
    pub ids: Vec<AssetId>,
    /// Currency codes to quote in.
    pub vs_currencies: Vec<CurrencyCode>,
}

impl QuoteRequest {
    /// Request `ids` quoted in a single currency.
    #[must_use]
    pub fn new(ids: Vec<AssetId>, currency: impl Into<CurrencyCode>) -> Self {
        Self {
            ids,
            vs_currencies: vec![currency.into()],
        }
    }

    /// Comma-joined `ids` query parameter.
    #[must_use]
    pub fn ids_param(&self) -> String {
        self.ids.join(",")
    }

    /// Comma-joined `vs_currencies` query parameter.
    #[must_use]
    pub fn vs_currencies_param(&self) -> String {
        self.vs_currencies.join(",")
    }
}

/// Transport-level failure talking to the price source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PriceSourceError {
    /// No response within the configured timeout.
    #[error("request timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    /// Could not connect (refused, DNS failure, TLS handshake).
    #[error("connection failed: {0}")]
    Connect(String),

    /// Upstream answered with a non-2xx status.
    #[error("upstream returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    /// Any other transport error (body read, protocol).
    #[error("transport error: {0}")]
    Transport(String),
}

/// Upstream price API.
///
/// Returns the raw body of a 2xx response; classification of the body is
/// left to the caller so every source shares the same semantics.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Issue one request for `request`.
    async fn fetch(&self, request: &QuoteRequest) -> Result<Vec<u8>, PriceSourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_request_params() {
        let request = QuoteRequest::new(
            vec!["bitcoin".to_string(), "shiba-inu".to_string()],
            "usd",
        );
        assert_eq!(request.ids_param(), "bitcoin,shiba-inu");
        assert_eq!(request.vs_currencies_param(), "usd");
    }

    #[tokio::test(start_paused = true)]
    async fn cache_entry_expires_after_ttl() {
        let entry = CacheEntry::new(PriceQuoteSet::new(), Duration::from_secs(300));
        assert!(entry.is_fresh());

        tokio::time::advance(Duration::from_secs(299)).await;
        assert!(entry.is_fresh());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(!entry.is_fresh());
        assert_eq!(entry.age(), Duration::from_secs(300));
    }

    #[test]
    fn price_source_error_messages() {
        let timeout = PriceSourceError::Timeout(Duration::from_secs(5));
        assert_eq!(timeout.to_string(), "request timed out after 5s");

        let status = PriceSourceError::Status {
            status: 500,
            body: "oops".to_string(),
        };
        assert_eq!(status.to_string(), "upstream returned HTTP 500: oops");
    }
}
