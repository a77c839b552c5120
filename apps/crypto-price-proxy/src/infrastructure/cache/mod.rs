//! In-Memory Quote Cache
//!
//! Process-wide `QuoteCache` adapter. Created empty at startup; entries
//! expire individually by TTL and are overwritten by the next `set`.
//! Expired entries stay in the map (see [`InMemoryQuoteCache::peek`]) but
//! are never returned from `get`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::application::ports::{CacheEntry, QuoteCache};
use crate::domain::quotes::PriceQuoteSet;

/// `QuoteCache` backed by a locked hash map.
#[derive(Debug, Default)]
pub struct InMemoryQuoteCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemoryQuoteCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry stored under `key`, whether fresh or expired.
    #[must_use]
    pub fn peek(&self, key: &str) -> Option<CacheEntry> {
        self.entries.read().get(key).cloned()
    }

    /// Number of stored entries, including expired ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether nothing has been stored yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl QuoteCache for InMemoryQuoteCache {
    async fn get(&self, key: &str) -> Option<CacheEntry> {
        self.entries
            .read()
            .get(key)
            .filter(|entry| entry.is_fresh())
            .cloned()
    }

    async fn set(&self, key: &str, value: PriceQuoteSet, ttl: Duration) {
        self.entries
            .write()
            .insert(key.to_string(), CacheEntry::new(value, ttl));
    }
}
