//! Proxy Configuration Settings
//!
//! Configuration types for the price proxy, loaded from environment variables.

use std::time::Duration;

use crate::application::services::{DEFAULT_CACHE_TTL, ProxySettings};

/// Default upstream endpoint (CoinGecko simple price).
pub const DEFAULT_UPSTREAM_URL: &str = "https://api.coingecko.com/api/v3/simple/price";

/// Assets served when `PRICE_PROXY_ASSET_IDS` is unset.
pub const DEFAULT_ASSET_IDS: [&str; 10] = [
    "bitcoin",
    "ethereum",
    "ripple",
    "cardano",
    "dogecoin",
    "polkadot",
    "binancecoin",
    "solana",
    "shiba-inu",
    "litecoin",
];

/// Currency served when `PRICE_PROXY_VS_CURRENCY` is unset.
pub const DEFAULT_VS_CURRENCY: &str = "usd";

/// Optional CoinGecko API key.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a key.
    #[must_use]
    pub const fn new(key: String) -> Self {
        Self(key)
    }

    /// Get the key.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey([REDACTED])")
    }
}

/// Upstream price source settings.
#[derive(Debug, Clone)]
pub struct UpstreamSettings {
    /// Simple-price endpoint URL.
    pub url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Optional API key sent with every request.
    pub api_key: Option<ApiKey>,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_UPSTREAM_URL.to_string(),
            timeout: Duration::from_secs(5),
            api_key: None,
        }
    }
}

/// Which quotes to serve and how long to cache them.
#[derive(Debug, Clone)]
pub struct QuoteSettings {
    /// Asset identifiers, in display order.
    pub asset_ids: Vec<String>,
    /// Currency to quote in.
    pub vs_currency: String,
    /// Cache freshness window.
    pub cache_ttl: Duration,
}

impl Default for QuoteSettings {
    fn default() -> Self {
        Self {
            asset_ids: DEFAULT_ASSET_IDS.iter().map(ToString::to_string).collect(),
            vs_currency: DEFAULT_VS_CURRENCY.to_string(),
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }
}

impl QuoteSettings {
    /// Proxy settings derived from these quote settings.
    #[must_use]
    pub fn proxy_settings(&self) -> ProxySettings {
        ProxySettings::new(self.asset_ids.clone(), self.vs_currency.clone())
            .with_cache_ttl(self.cache_ttl)
    }
}

/// Server port settings.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// HTTP port for the API, chart, health and metrics routes.
    pub http_port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { http_port: 8000 }
    }
}

/// Complete proxy configuration.
#[derive(Debug, Clone, Default)]
pub struct ProxyConfig {
    /// Server port settings.
    pub server: ServerSettings,
    /// Upstream price source settings.
    pub upstream: UpstreamSettings,
    /// Quote selection and caching.
    pub quotes: QuoteSettings,
}

impl ProxyConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an unusable value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let server = ServerSettings {
            http_port: parse_u16(&lookup, "PRICE_PROXY_HTTP_PORT", defaults.server.http_port),
        };

        let url = lookup("PRICE_PROXY_UPSTREAM_URL").unwrap_or(defaults.upstream.url);
        if reqwest::Url::parse(&url).is_err() {
            return Err(ConfigError::InvalidValue {
                key: "PRICE_PROXY_UPSTREAM_URL".to_string(),
                value: url,
            });
        }

        let api_key = lookup("COINGECKO_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .map(ApiKey::new);

        let upstream = UpstreamSettings {
            url,
            timeout: parse_duration_secs(
                &lookup,
                "PRICE_PROXY_UPSTREAM_TIMEOUT_SECS",
                defaults.upstream.timeout,
            ),
            api_key,
        };

        let asset_ids = match lookup("PRICE_PROXY_ASSET_IDS") {
            Some(raw) => parse_list(&raw),
            None => defaults.quotes.asset_ids,
        };
        if asset_ids.is_empty() {
            return Err(ConfigError::EmptyValue("PRICE_PROXY_ASSET_IDS".to_string()));
        }

        let vs_currency = lookup("PRICE_PROXY_VS_CURRENCY")
            .map_or(defaults.quotes.vs_currency, |v| v.trim().to_lowercase());
        if vs_currency.is_empty() {
            return Err(ConfigError::EmptyValue("PRICE_PROXY_VS_CURRENCY".to_string()));
        }

        let quotes = QuoteSettings {
            asset_ids,
            vs_currency,
            cache_ttl: parse_duration_secs(
                &lookup,
                "PRICE_PROXY_CACHE_TTL_SECS",
                defaults.quotes.cache_ttl,
            ),
        };

        Ok(Self {
            server,
            upstream,
            quotes,
        })
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
    /// Environment variable has a value that cannot be used.
    #[error("environment variable {key} has invalid value '{value}'")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// Offending value.
        value: String,
    },
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|item| item.trim().to_lowercase())
        .filter(|item| !item.is_empty())
        .collect()
}

fn parse_u16(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u16) -> u16 {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_duration_secs(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: Duration,
) -> Duration {
    lookup(key)
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map_or(default, Duration::from_secs)
}
