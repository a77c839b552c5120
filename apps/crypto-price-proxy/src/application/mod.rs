//! Application Layer - Use cases and port definitions.
//!
//! This layer contains the proxy service and the port interfaces that
//! define how it reaches the cache and the upstream price source.

/// Port interfaces for external systems (cache, price source).
pub mod ports;

/// Application services (the cached price proxy).
pub mod services;
