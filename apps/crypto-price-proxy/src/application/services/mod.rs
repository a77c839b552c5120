//! Application Services
//!
//! - `PriceCacheProxy`: cached access to the upstream quote set

mod price_cache_proxy;

pub use price_cache_proxy::{
    CACHE_KEY, DEFAULT_CACHE_TTL, PriceCacheProxy, ProxySettings, ProxyStats, ProxyStatsSnapshot,
};
