//! Price source adapters.
//!
//! Each external provider implements the same contract: fetch the current
//! per-unit price for one material, with its own timeout and no internal
//! retries. Parsing and transport differences stay inside each adapter and
//! never leak into the pricing service.

mod directory;
mod marketplace;

pub use directory::LocalSupplierDirectory;
pub use marketplace::MarketplaceAggregator;

use crate::config::{Config, LOCAL_DIRECTORY_PROVIDER, MARKETPLACE_PROVIDER};
use crate::error::SourceError;
use crate::models::PriceQuote;

/// A configured price source, dispatched by variant
pub enum PriceSource {
    Marketplace(MarketplaceAggregator),
    LocalDirectory(LocalSupplierDirectory),
}

impl PriceSource {
    pub fn name(&self) -> &'static str {
        match self {
            PriceSource::Marketplace(_) => MARKETPLACE_PROVIDER,
            PriceSource::LocalDirectory(_) => LOCAL_DIRECTORY_PROVIDER,
        }
    }

    /// Fetch a quote for one material. Each call is independent; no shared
    /// mutable state across materials.
    pub async fn fetch(&self, material_id: &str) -> Result<PriceQuote, SourceError> {
        match self {
            PriceSource::Marketplace(provider) => provider.fetch(material_id).await,
            PriceSource::LocalDirectory(provider) => provider.fetch(material_id).await,
        }
    }
}

/// Build the configured sources in priority order.
///
/// Assumes the configuration has already been validated: every priority
/// entry names a known, enabled provider.
pub fn build_sources(cfg: &Config) -> anyhow::Result<Vec<PriceSource>> {
    let mut sources = Vec::with_capacity(cfg.resolution.provider_priority.len());

    for name in &cfg.resolution.provider_priority {
        let source = match name.as_str() {
            MARKETPLACE_PROVIDER => {
                PriceSource::Marketplace(MarketplaceAggregator::new(cfg.providers.marketplace.clone()))
            }
            LOCAL_DIRECTORY_PROVIDER => PriceSource::LocalDirectory(LocalSupplierDirectory::new(
                cfg.providers.local_directory.clone(),
            )),
            _ => anyhow::bail!("unknown provider in provider_priority: {}", name),
        };
        sources.push(source);
    }

    Ok(sources)
}
