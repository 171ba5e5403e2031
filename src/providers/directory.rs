use crate::{config::LocalDirectoryConfig, error::SourceError, models::PriceQuote};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Local supplier directory: a TOML price list published by nearby
/// suppliers, re-read on every fetch so edits take effect without restart.
pub struct LocalSupplierDirectory {
    config: LocalDirectoryConfig,
}

/// On-disk listing format:
///
/// ```toml
/// currency = "INR"
///
/// [materials]
/// cement = 400.0
/// sand = 55.0
/// ```
#[derive(Debug, Deserialize)]
struct DirectoryListing {
    currency: String,
    #[serde(default)]
    materials: HashMap<String, Decimal>,
}

impl LocalSupplierDirectory {
    pub fn new(config: LocalDirectoryConfig) -> Self {
        Self { config }
    }

    /// Look up a material in the supplier price list
    pub async fn fetch(&self, material_id: &str) -> Result<PriceQuote, SourceError> {
        let timeout = Duration::from_secs(self.config.timeout_seconds);
        let read = tokio::fs::read_to_string(&self.config.listing_path);

        let raw = tokio::time::timeout(timeout, read)
            .await
            .map_err(|_| {
                SourceError::SourceUnavailable(format!(
                    "supplier listing read timed out after {}s",
                    self.config.timeout_seconds
                ))
            })?
            .map_err(|e| {
                SourceError::SourceUnavailable(format!(
                    "cannot read supplier listing {}: {}",
                    self.config.listing_path.display(),
                    e
                ))
            })?;

        let listing: DirectoryListing =
            toml::from_str(&raw).map_err(|e| SourceError::MalformedData(e.to_string()))?;

        let unit_price = listing
            .materials
            .get(material_id)
            .copied()
            .ok_or_else(|| SourceError::NoListing(material_id.to_string()))?;

        if unit_price <= Decimal::ZERO {
            return Err(SourceError::MalformedData(format!(
                "non-positive unit price {} for '{}'",
                unit_price, material_id
            )));
        }

        Ok(PriceQuote {
            material_id: material_id.to_string(),
            unit_price,
            currency: listing.currency,
            source: crate::config::LOCAL_DIRECTORY_PROVIDER.to_string(),
            fetched_at: Utc::now(),
        })
    }
}
