use crate::{config::MarketplaceConfig, error::SourceError, models::PriceQuote};
use chrono::Utc;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

/// Marketplace aggregator: a remote price listing API queried per material.
///
/// Applies its own request timeout and never retries; retry policy belongs
/// to the pricing service's fallback chain.
pub struct MarketplaceAggregator {
    client: Client,
    config: MarketplaceConfig,
}

/// Wire format of one marketplace listing
#[derive(Debug, Deserialize)]
struct ListingResponse {
    unit_price: Decimal,
    currency: String,
}

impl MarketplaceAggregator {
    pub fn new(config: MarketplaceConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Fetch the current listing for a material
    pub async fn fetch(&self, material_id: &str) -> Result<PriceQuote, SourceError> {
        let url = format!("{}/listings/{}", self.config.base_url, material_id);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .timeout(Duration::from_secs(self.config.timeout_seconds))
            .send()
            .await
            .map_err(|e| classify_transport_error(&e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(SourceError::NoListing(material_id.to_string()));
        }
        if !response.status().is_success() {
            return Err(SourceError::SourceUnavailable(format!(
                "marketplace returned HTTP {}",
                response.status()
            )));
        }

        let listing: ListingResponse = response
            .json()
            .await
            .map_err(|e| SourceError::MalformedData(e.to_string()))?;

        if listing.unit_price <= Decimal::ZERO {
            return Err(SourceError::MalformedData(format!(
                "non-positive unit price {} for '{}'",
                listing.unit_price, material_id
            )));
        }

        Ok(PriceQuote {
            material_id: material_id.to_string(),
            unit_price: listing.unit_price,
            currency: listing.currency,
            source: crate::config::MARKETPLACE_PROVIDER.to_string(),
            fetched_at: Utc::now(),
        })
    }
}

fn classify_transport_error(error: &reqwest::Error) -> SourceError {
    if error.is_timeout() || error.is_connect() {
        return SourceError::SourceUnavailable(error.to_string());
    }
    if error.is_decode() {
        return SourceError::MalformedData(error.to_string());
    }
    SourceError::SourceUnavailable(error.to_string())
}
