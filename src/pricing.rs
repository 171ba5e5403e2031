//! Price resolution.
//!
//! Resolves one material at a time: fresh cache entries short-circuit any
//! provider call, otherwise the configured sources are consulted and the
//! first usable quote is written through to the cache. When every source
//! fails, an expired cache entry is returned flagged as a stale fallback;
//! only a material no source has ever quoted fails resolution.

use crate::cache::{CacheLookup, PriceCache};
use crate::config::TieBreak;
use crate::error::{PricingError, SourceError};
use crate::models::{PriceQuote, ResolvedPrice};
use crate::providers::PriceSource;
use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;

pub struct PricingService {
    cache: Arc<PriceCache>,
    /// Sources in configured priority order
    sources: Vec<PriceSource>,
    tie_break: TieBreak,
}

impl PricingService {
    pub fn new(cache: Arc<PriceCache>, sources: Vec<PriceSource>, tie_break: TieBreak) -> Self {
        Self {
            cache,
            sources,
            tie_break,
        }
    }

    /// Resolve a price for one material.
    ///
    /// Never fails while any usable quote exists (fresh cache, fresh fetch,
    /// or stale fallback); fails with `PriceUnavailable` only when no source
    /// has ever produced a quote for the material.
    pub async fn resolve(&self, material_id: &str) -> Result<ResolvedPrice, PricingError> {
        if let CacheLookup::Fresh(quote) = self.cache.lookup(material_id, Utc::now()) {
            tracing::debug!(
                material = material_id,
                source = %quote.source,
                "price served from cache"
            );
            return Ok(ResolvedPrice {
                quote,
                is_stale_fallback: false,
            });
        }

        let fetched = match self.tie_break {
            TieBreak::Priority => self.fetch_in_priority_order(material_id).await,
            TieBreak::FirstSuccess => self.fetch_first_success(material_id).await,
        };

        if let Some(quote) = fetched {
            self.cache.put(quote.clone());
            return Ok(ResolvedPrice {
                quote,
                is_stale_fallback: false,
            });
        }

        // Every provider failed; fall back to an expired entry if one survives
        match self.cache.lookup(material_id, Utc::now()) {
            CacheLookup::Stale(quote) => {
                tracing::warn!(
                    material = material_id,
                    source = %quote.source,
                    fetched_at = %quote.fetched_at,
                    "all providers failed, using stale cached price"
                );
                Ok(ResolvedPrice {
                    quote,
                    is_stale_fallback: true,
                })
            }
            _ => Err(PricingError::PriceUnavailable(material_id.to_string())),
        }
    }

    /// Query sources one at a time in priority order; first success wins.
    /// Deterministic regardless of per-source latency.
    async fn fetch_in_priority_order(&self, material_id: &str) -> Option<PriceQuote> {
        for source in &self.sources {
            match source.fetch(material_id).await {
                Ok(quote) => {
                    tracing::info!(
                        material = material_id,
                        source = source.name(),
                        price = %quote.unit_price,
                        "fetched quote"
                    );
                    return Some(quote);
                }
                Err(e) => log_source_failure(source.name(), material_id, &e),
            }
        }
        None
    }

    /// Query all sources concurrently; the lowest-latency success wins
    async fn fetch_first_success(&self, material_id: &str) -> Option<PriceQuote> {
        let mut pending: FuturesUnordered<_> = self
            .sources
            .iter()
            .map(|source| async move { (source.name(), source.fetch(material_id).await) })
            .collect();

        while let Some((name, result)) = pending.next().await {
            match result {
                Ok(quote) => {
                    tracing::info!(
                        material = material_id,
                        source = name,
                        price = %quote.unit_price,
                        "fetched quote (first success)"
                    );
                    return Some(quote);
                }
                Err(e) => log_source_failure(name, material_id, &e),
            }
        }
        None
    }
}

fn log_source_failure(source: &str, material_id: &str, error: &SourceError) {
    match error {
        // Absence at one source is expected; transport trouble is not
        SourceError::NoListing(_) => {
            tracing::debug!(material = material_id, source, "no listing")
        }
        _ => tracing::warn!(material = material_id, source, error = %error, "source failed"),
    }
}
