//! Pipeline orchestration: pricing then cost computation.
//!
//! Resolves every unique material concurrently (bounded), then hands the
//! complete price map to the engine. Partial results are never returned:
//! if any material stays unpriced the whole run fails with the full list
//! of blocked materials.

use crate::cache::PriceCache;
use crate::config::Config;
use crate::engine::CostEngine;
use crate::error::{PipelineError, PricingError};
use crate::models::{CostBreakdown, MaterialQuantity, ResolvedPrice};
use crate::pricing::PricingService;
use crate::providers;
use chrono::{Duration, Utc};
use futures::stream::{self, StreamExt};
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

pub struct Pipeline {
    pricing: Arc<PricingService>,
    engine: CostEngine,
    concurrency_limit: usize,
    /// Abort once this many materials have failed; `None` = resolve them all
    failure_threshold: Option<usize>,
}

impl Pipeline {
    pub fn new(
        pricing: Arc<PricingService>,
        engine: CostEngine,
        concurrency_limit: usize,
        failure_threshold: Option<usize>,
    ) -> Self {
        Self {
            pricing,
            engine,
            concurrency_limit: concurrency_limit.max(1),
            failure_threshold,
        }
    }

    /// Wire up cache, sources, service, and engine from a validated config
    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let cache = Arc::new(match cfg.cache.capacity {
            0 => PriceCache::new(Duration::seconds(cfg.cache.ttl_seconds as i64)),
            capacity => {
                PriceCache::with_capacity(Duration::seconds(cfg.cache.ttl_seconds as i64), capacity)
            }
        });
        let sources = providers::build_sources(cfg)?;
        let pricing = Arc::new(PricingService::new(cache, sources, cfg.resolution.tie_break));

        Ok(Self::new(
            pricing,
            CostEngine::new(&cfg.pricing),
            cfg.resolution.concurrency_limit,
            match cfg.resolution.failure_threshold {
                0 => None,
                n => Some(n),
            },
        ))
    }

    /// Price all materials and compute the cost breakdown.
    ///
    /// Fails with `PricingFailed` listing every unresolved material if any
    /// material has no resolvable price; a run aborted at the failure
    /// threshold also lists materials whose resolution was still pending.
    pub async fn run(
        &self,
        quantities: &[MaterialQuantity],
    ) -> Result<CostBreakdown, PipelineError> {
        validate_quantities(quantities)?;

        // Resolve each unique material once, preserving first-seen order
        let mut unique: Vec<String> = Vec::new();
        for mq in quantities {
            if !unique.contains(&mq.material_id) {
                unique.push(mq.material_id.clone());
            }
        }

        let mut resolved: HashMap<String, ResolvedPrice> = HashMap::with_capacity(unique.len());
        let mut failed: BTreeSet<String> = BTreeSet::new();

        {
            let mut results = stream::iter(unique.iter().cloned())
                .map(|material_id| {
                    let pricing = Arc::clone(&self.pricing);
                    async move {
                        let result = pricing.resolve(&material_id).await;
                        (material_id, result)
                    }
                })
                .buffer_unordered(self.concurrency_limit);

            while let Some((material_id, result)) = results.next().await {
                match result {
                    Ok(price) => {
                        resolved.insert(material_id, price);
                    }
                    Err(PricingError::PriceUnavailable(_)) => {
                        tracing::error!(material = %material_id, "no resolvable price");
                        failed.insert(material_id);
                    }
                }

                if let Some(threshold) = self.failure_threshold {
                    if failed.len() >= threshold {
                        tracing::error!(
                            failed = failed.len(),
                            threshold,
                            "failure threshold reached, cancelling pending resolutions"
                        );
                        break;
                    }
                }
            }
            // Dropping the stream cancels any in-flight resolutions
        }

        if !failed.is_empty() {
            // Atomic failure: report everything not resolved, including
            // materials whose resolution was cancelled by the early abort
            let materials: BTreeSet<String> = unique
                .iter()
                .filter(|id| !resolved.contains_key(*id))
                .cloned()
                .collect();
            return Err(PipelineError::PricingFailed { materials });
        }

        let breakdown = self.engine.compute(quantities, &resolved, Utc::now())?;

        tracing::info!(
            materials = quantities.len(),
            stale = breakdown.stale_materials.len(),
            total = %breakdown.total_cost,
            currency = %breakdown.currency,
            "estimate complete"
        );

        Ok(breakdown)
    }
}

/// Enforce the collaborator contract on pipeline input
fn validate_quantities(quantities: &[MaterialQuantity]) -> Result<(), PipelineError> {
    for mq in quantities {
        if mq.material_id.is_empty() || mq.material_id.len() > 128 {
            return Err(PipelineError::InvalidQuantity {
                material_id: mq.material_id.clone(),
                reason: "material id must be between 1 and 128 characters".to_string(),
            });
        }
        let is_valid_id = mq
            .material_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_');
        if !is_valid_id {
            return Err(PipelineError::InvalidQuantity {
                material_id: mq.material_id.clone(),
                reason: "material id may contain only alphanumerics, hyphens, dots, and underscores"
                    .to_string(),
            });
        }
        if mq.quantity <= Decimal::ZERO {
            return Err(PipelineError::InvalidQuantity {
                material_id: mq.material_id.clone(),
                reason: format!("quantity must be positive, got {}", mq.quantity),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LocalDirectoryConfig, PricingConfig, TieBreak};
    use crate::models::Unit;
    use crate::providers::{LocalSupplierDirectory, PriceSource};
    use rust_decimal_macros::dec;
    use std::io::Write;
    use std::path::PathBuf;

    fn create_test_pipeline(
        sources: Vec<PriceSource>,
        failure_threshold: Option<usize>,
    ) -> Pipeline {
        let cache = Arc::new(PriceCache::new(Duration::hours(24)));
        let pricing = Arc::new(PricingService::new(cache, sources, TieBreak::Priority));
        Pipeline::new(
            pricing,
            CostEngine::new(&PricingConfig::default()),
            2,
            failure_threshold,
        )
    }

    fn create_directory_source(dir: &tempfile::TempDir, contents: &str) -> PriceSource {
        let path = dir.path().join("suppliers.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();

        PriceSource::LocalDirectory(LocalSupplierDirectory::new(LocalDirectoryConfig {
            enabled: true,
            listing_path: path,
            timeout_seconds: 2,
        }))
    }

    fn create_broken_source() -> PriceSource {
        PriceSource::LocalDirectory(LocalSupplierDirectory::new(LocalDirectoryConfig {
            enabled: true,
            listing_path: PathBuf::from("/nonexistent/suppliers.toml"),
            timeout_seconds: 2,
        }))
    }

    fn quantity(material_id: &str, quantity: Decimal, unit: Unit) -> MaterialQuantity {
        MaterialQuantity {
            material_id: material_id.to_string(),
            quantity,
            unit,
        }
    }

    #[tokio::test]
    async fn test_run_produces_breakdown() {
        let dir = tempfile::tempdir().unwrap();
        let source = create_directory_source(
            &dir,
            "currency = \"INR\"\n[materials]\ncement = 400.0\nsand = 55.0\n",
        );
        let pipeline = create_test_pipeline(vec![source], None);

        let breakdown = pipeline
            .run(&[
                quantity("cement", dec!(50), Unit::Bag),
                quantity("sand", dec!(10), Unit::CubicM),
            ])
            .await
            .unwrap();

        assert_eq!(breakdown.line_items.len(), 2);
        // 20000 + 550 = 20550; labor 6165; contingency 3205.80
        assert_eq!(breakdown.material_subtotal, dec!(20550.00));
        assert_eq!(breakdown.total_cost, dec!(29920.80));
    }

    #[tokio::test]
    async fn test_run_rejects_non_positive_quantity() {
        let pipeline = create_test_pipeline(vec![create_broken_source()], None);

        let error = pipeline
            .run(&[quantity("cement", dec!(0), Unit::Bag)])
            .await
            .unwrap_err();
        assert!(matches!(error, PipelineError::InvalidQuantity { .. }));
    }

    #[tokio::test]
    async fn test_run_rejects_bad_material_id() {
        let pipeline = create_test_pipeline(vec![create_broken_source()], None);

        let error = pipeline
            .run(&[quantity("cement/../opc", dec!(1), Unit::Bag)])
            .await
            .unwrap_err();
        assert!(matches!(error, PipelineError::InvalidQuantity { .. }));
    }

    #[tokio::test]
    async fn test_run_fails_atomically_listing_unpriced_materials() {
        let dir = tempfile::tempdir().unwrap();
        // Only cement is listed; gravel and marble cannot be priced
        let source =
            create_directory_source(&dir, "currency = \"INR\"\n[materials]\ncement = 400.0\n");
        let pipeline = create_test_pipeline(vec![source], None);

        let error = pipeline
            .run(&[
                quantity("cement", dec!(50), Unit::Bag),
                quantity("gravel", dec!(5), Unit::CubicM),
                quantity("marble", dec!(12), Unit::SqM),
            ])
            .await
            .unwrap_err();

        match error {
            PipelineError::PricingFailed { materials } => {
                let expected: BTreeSet<String> =
                    ["gravel", "marble"].iter().map(|s| s.to_string()).collect();
                assert_eq!(materials, expected);
            }
            other => panic!("expected PricingFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failure_threshold_aborts_and_lists_pending_materials() {
        // Every resolution fails; the first failure crosses the threshold,
        // so the error must still cover all requested materials
        let pipeline = create_test_pipeline(vec![create_broken_source()], Some(1));

        let error = pipeline
            .run(&[
                quantity("cement", dec!(50), Unit::Bag),
                quantity("sand", dec!(10), Unit::CubicM),
                quantity("gravel", dec!(5), Unit::CubicM),
                quantity("steel_tmt", dec!(800), Unit::Kg),
            ])
            .await
            .unwrap_err();

        match error {
            PipelineError::PricingFailed { materials } => {
                // Nothing resolved before the abort, so every material is listed
                let expected: BTreeSet<String> = ["cement", "sand", "gravel", "steel_tmt"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect();
                assert_eq!(materials, expected);
            }
            other => panic!("expected PricingFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_duplicate_materials_share_one_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let source =
            create_directory_source(&dir, "currency = \"INR\"\n[materials]\ncement = 400.0\n");
        let pipeline = create_test_pipeline(vec![source], None);

        let breakdown = pipeline
            .run(&[
                quantity("cement", dec!(30), Unit::Bag),
                quantity("cement", dec!(20), Unit::Bag),
            ])
            .await
            .unwrap();

        assert_eq!(breakdown.line_items.len(), 2);
        assert_eq!(breakdown.line_items[0].unit_price, breakdown.line_items[1].unit_price);
        assert_eq!(breakdown.material_subtotal, dec!(20000.00));
    }
}
