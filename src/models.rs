use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Measurement unit for a material quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Kg,
    Bag,
    CubicM,
    SqM,
    Piece,
    Litre,
    Tonne,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Kg => "kg",
            Unit::Bag => "bag",
            Unit::CubicM => "cubic_m",
            Unit::SqM => "sq_m",
            Unit::Piece => "piece",
            Unit::Litre => "litre",
            Unit::Tonne => "tonne",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One material requirement produced by the quantity extractor.
/// Immutable once handed to the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialQuantity {
    pub material_id: String,
    pub quantity: Decimal,
    pub unit: Unit,
}

/// A per-unit price obtained from one source at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub material_id: String,
    pub unit_price: Decimal,
    pub currency: String,
    /// Name of the provider that produced this quote
    pub source: String,
    pub fetched_at: DateTime<Utc>,
}

/// A quote held by the cache together with its freshness horizon
#[derive(Debug, Clone)]
pub struct CachedPrice {
    pub quote: PriceQuote,
    /// Always `fetched_at + TTL`
    pub expires_at: DateTime<Utc>,
}

impl CachedPrice {
    /// Whether this entry is past its TTL at `now`. Pure and deterministic;
    /// an expired entry behaves as absent on lookup but is retained as a
    /// last-resort fallback until overwritten or evicted.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// Outcome of price resolution for one material
#[derive(Debug, Clone)]
pub struct ResolvedPrice {
    pub quote: PriceQuote,
    /// True when every provider failed and an expired cache entry was used
    pub is_stale_fallback: bool,
}

/// One material's contribution to the cost breakdown
#[derive(Debug, Clone, Serialize)]
pub struct CostLineItem {
    pub material_id: String,
    pub quantity: Decimal,
    pub unit: Unit,
    pub unit_price: Decimal,
    /// quantity × unit_price, rounded to the configured currency precision
    pub line_total: Decimal,
    /// Age of the quote relative to the run, in seconds
    pub price_age_seconds: i64,
    pub is_stale_fallback: bool,
}

/// Itemized estimate for one pipeline run. Built once, never mutated;
/// a new run produces a new breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct CostBreakdown {
    /// Line items in input material order
    pub line_items: Vec<CostLineItem>,
    pub material_subtotal: Decimal,
    pub labor_cost: Decimal,
    pub contingency_cost: Decimal,
    pub total_cost: Decimal,
    pub currency: String,
    /// Materials priced from an expired cache entry, in input order
    pub stale_materials: Vec<String>,
}
