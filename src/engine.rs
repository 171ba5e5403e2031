//! Cost computation.
//!
//! Pure money math - no I/O, no clock, no price fetching. Given identical
//! inputs the engine returns identical output: aggregates are computed from
//! unrounded line values and rounded once at the end, so per-line rounding
//! never compounds into the totals.

use crate::config::PricingConfig;
use crate::error::EngineError;
use crate::models::{CostBreakdown, CostLineItem, MaterialQuantity, ResolvedPrice};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Round to `places` decimal places using banker's rounding
/// (round-half-even), the same rule applied to every money value.
pub fn round_money(amount: Decimal, places: u32) -> Decimal {
    amount.round_dp_with_strategy(places, RoundingStrategy::MidpointNearestEven)
}

pub struct CostEngine {
    labor_rate: Decimal,
    contingency_rate: Decimal,
    currency: String,
    currency_precision: u32,
}

impl CostEngine {
    pub fn new(cfg: &PricingConfig) -> Self {
        Self {
            labor_rate: cfg.labor_rate,
            contingency_rate: cfg.contingency_rate,
            currency: cfg.currency.clone(),
            currency_precision: cfg.currency_precision,
        }
    }

    /// Compute the itemized breakdown for the given quantities and resolved
    /// prices.
    ///
    /// `as_of` anchors the reported price ages so identical inputs yield
    /// bit-identical output. Fails with `MissingPrice` when a material has
    /// no resolved price; the orchestrator resolves every material first,
    /// so hitting this is a programming error, not a retryable condition.
    pub fn compute(
        &self,
        quantities: &[MaterialQuantity],
        prices: &HashMap<String, ResolvedPrice>,
        as_of: DateTime<Utc>,
    ) -> Result<CostBreakdown, EngineError> {
        let mut line_items = Vec::with_capacity(quantities.len());
        let mut stale_materials: Vec<String> = Vec::new();
        let mut raw_subtotal = Decimal::ZERO;

        for mq in quantities {
            let resolved = prices
                .get(&mq.material_id)
                .ok_or_else(|| EngineError::MissingPrice(mq.material_id.clone()))?;

            let raw_line = mq.quantity * resolved.quote.unit_price;
            raw_subtotal += raw_line;

            if resolved.is_stale_fallback && !stale_materials.contains(&mq.material_id) {
                stale_materials.push(mq.material_id.clone());
            }

            line_items.push(CostLineItem {
                material_id: mq.material_id.clone(),
                quantity: mq.quantity,
                unit: mq.unit,
                unit_price: resolved.quote.unit_price,
                line_total: round_money(raw_line, self.currency_precision),
                price_age_seconds: (as_of - resolved.quote.fetched_at).num_seconds().max(0),
                is_stale_fallback: resolved.is_stale_fallback,
            });
        }

        let raw_labor = raw_subtotal * self.labor_rate;
        let raw_contingency = (raw_subtotal + raw_labor) * self.contingency_rate;
        let raw_total = raw_subtotal + raw_labor + raw_contingency;

        Ok(CostBreakdown {
            line_items,
            material_subtotal: round_money(raw_subtotal, self.currency_precision),
            labor_cost: round_money(raw_labor, self.currency_precision),
            contingency_cost: round_money(raw_contingency, self.currency_precision),
            total_cost: round_money(raw_total, self.currency_precision),
            currency: self.currency.clone(),
            stale_materials,
        })
    }
}
