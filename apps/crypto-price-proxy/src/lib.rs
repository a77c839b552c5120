#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! Crypto Price Proxy - Cached Market Quote Service
//!
//! An HTTP service that fetches current prices for a fixed set of crypto
//! assets from CoinGecko, caches the quote set for a short window, and
//! serves it as JSON and as an HTML bar chart. Upstream quota exhaustion
//! and transport failures are reported as distinct outcomes, never cached.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Quote types and fetch outcomes
//!   - `quotes`: Ordered quote sets and chart series
//!   - `outcome`: Fetch outcomes and payload classification
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: Cache and price source interfaces
//!   - `services`: The cached price proxy
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `cache`: In-memory TTL cache
//!   - `coingecko`: Upstream HTTP client
//!   - `http`: JSON, chart and index endpoints
//!   - `health`: Health, readiness and metrics endpoints
//!   - `config`: Environment configuration
//!
//! # Data Flow
//!
//! ```text
//!                      ┌──────────────┐  miss   ┌───────────┐
//! /api/crypto-prices ─►│              │────────►│ CoinGecko │
//!                      │ PriceCache   │◄────────│   API     │
//! /api/crypto-chart ──►│   Proxy      │         └───────────┘
//!                      │              │◄──hit──┐
//!                      └──────┬───────┘        │
//!                             └─── success ──► cache (TTL 300s)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Quote types with no I/O.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::outcome::{FetchOutcome, OutcomeKind, classify_payload};
pub use domain::quotes::{AssetId, ChartSeries, CurrencyCode, Price, PriceQuoteSet, Quote};

// Application
pub use application::ports::{
    CacheEntry, PriceSource, PriceSourceError, QuoteCache, QuoteRequest,
};
pub use application::services::{
    CACHE_KEY, DEFAULT_CACHE_TTL, PriceCacheProxy, ProxySettings, ProxyStatsSnapshot,
};

// Infrastructure config
pub use infrastructure::config::{
    ConfigError, ProxyConfig, QuoteSettings, ServerSettings, UpstreamSettings,
};

// Adapters
pub use infrastructure::cache::InMemoryQuoteCache;
pub use infrastructure::coingecko::CoinGeckoClient;

// HTTP server
pub use infrastructure::http::{AppState, HttpServer, HttpServerError, create_router};

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};
