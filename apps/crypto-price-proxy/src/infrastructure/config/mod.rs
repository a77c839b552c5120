//! Configuration Module
//!
//! Configuration loading for the proxy service.

mod settings;

pub use settings::{
    ApiKey, ConfigError, DEFAULT_ASSET_IDS, DEFAULT_UPSTREAM_URL, DEFAULT_VS_CURRENCY, ProxyConfig,
    QuoteSettings, ServerSettings, UpstreamSettings,
};
