//! Infrastructure Layer - Adapters and external integrations.
//!
//! This layer contains the concrete implementations of the port interfaces
//! defined in the application layer, plus the HTTP surface driving them.

/// In-memory quote cache.
pub mod cache;

/// CoinGecko simple-price client.
pub mod coingecko;

/// Configuration loading.
pub mod config;

/// Health check and metrics routes.
pub mod health;

/// HTTP API, chart rendering and server lifecycle.
pub mod http;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// Logging and OpenTelemetry tracing integration.
pub mod telemetry;
