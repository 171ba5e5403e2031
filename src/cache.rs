//! Time-bounded price cache.
//!
//! Shields the price sources from redundant calls and keeps expired entries
//! around as a last-resort fallback for when every provider fails. Eviction
//! is lazy (checked at read time); an optional capacity bound evicts the
//! least-recently-used entry on insert.

use crate::models::{CachedPrice, PriceQuote};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

/// Result of a cache lookup at a given instant
#[derive(Debug, Clone)]
pub enum CacheLookup {
    /// A non-expired entry; safe to serve without consulting any provider
    Fresh(PriceQuote),
    /// An entry past its TTL; usable only as a flagged fallback
    Stale(PriceQuote),
    Miss,
}

/// Concurrent per-key price cache with a fixed TTL.
///
/// Explicitly constructed and passed by reference to the pricing service;
/// never ambient global state, so tests get isolation from fresh instances.
/// Concurrent writes to the same key resolve by last write wins.
pub struct PriceCache {
    entries: DashMap<String, Entry>,
    ttl: Duration,
    capacity: Option<usize>,
}

struct Entry {
    cached: CachedPrice,
    last_used: DateTime<Utc>,
}

impl PriceCache {
    /// Unbounded cache with the given TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            capacity: None,
        }
    }

    /// Cache bounded to `capacity` entries, evicting least-recently-used
    pub fn with_capacity(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            capacity: Some(capacity.max(1)),
        }
    }

    /// Look up a material's cached quote at `now`.
    ///
    /// An expired entry is reported as `Stale` rather than removed, so the
    /// caller can still use it once every provider has failed.
    pub fn lookup(&self, material_id: &str, now: DateTime<Utc>) -> CacheLookup {
        match self.entries.get_mut(material_id) {
            Some(mut entry) => {
                entry.last_used = now;
                if entry.cached.is_expired(now) {
                    CacheLookup::Stale(entry.cached.quote.clone())
                } else {
                    CacheLookup::Fresh(entry.cached.quote.clone())
                }
            }
            None => CacheLookup::Miss,
        }
    }

    /// Store a quote, with expiry derived from its fetch time plus the TTL.
    /// Overwrites any previous entry for the material.
    pub fn put(&self, quote: PriceQuote) {
        let expires_at = quote.fetched_at + self.ttl;
        let material_id = quote.material_id.clone();

        if let Some(capacity) = self.capacity {
            if self.entries.len() >= capacity && !self.entries.contains_key(&material_id) {
                self.evict_lru();
            }
        }

        self.entries.insert(
            material_id,
            Entry {
                last_used: quote.fetched_at,
                cached: CachedPrice { quote, expires_at },
            },
        );
    }

    /// Drop all entries (explicit teardown)
    pub fn flush(&self) {
        self.entries.clear();
        tracing::debug!("price cache flushed");
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    fn evict_lru(&self) {
        let victim = self
            .entries
            .iter()
            .min_by_key(|entry| entry.value().last_used)
            .map(|entry| entry.key().clone());

        if let Some(material_id) = victim {
            self.entries.remove(&material_id);
            tracing::debug!(material = %material_id, "evicted least-recently-used price");
        }
    }
}
