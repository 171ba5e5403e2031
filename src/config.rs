use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub resolution: ResolutionConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PricingConfig {
    /// Labor cost as a multiple of the material subtotal
    pub labor_rate: Decimal,
    /// Buffer applied to material + labor cost
    pub contingency_rate: Decimal,
    pub currency: String,
    /// Decimal places for money, rounded half-even
    pub currency_precision: u32,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            labor_rate: dec!(0.30),
            contingency_rate: dec!(0.12),
            currency: "INR".to_string(),
            currency_precision: 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    pub ttl_seconds: u64,
    /// 0 = unbounded, otherwise bounded with LRU eviction
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 86_400,
            capacity: 0,
        }
    }
}

/// How multiple successful providers are reconciled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Always prefer the configured priority order (reproducible)
    Priority,
    /// Prefer the lowest-latency responder
    FirstSuccess,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolutionConfig {
    /// Provider names in priority order; must reference enabled providers
    pub provider_priority: Vec<String>,
    pub tie_break: TieBreak,
    /// Upper bound on concurrent per-material resolutions
    pub concurrency_limit: usize,
    /// Abort the run once this many materials have failed; 0 = no early abort
    pub failure_threshold: usize,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            provider_priority: vec![
                MARKETPLACE_PROVIDER.to_string(),
                LOCAL_DIRECTORY_PROVIDER.to_string(),
            ],
            tie_break: TieBreak::Priority,
            concurrency_limit: 4,
            failure_threshold: 0,
        }
    }
}

pub const MARKETPLACE_PROVIDER: &str = "marketplace";
pub const LOCAL_DIRECTORY_PROVIDER: &str = "local_directory";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub marketplace: MarketplaceConfig,
    #[serde(default)]
    pub local_directory: LocalDirectoryConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MarketplaceConfig {
    pub enabled: bool,
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: String::new(),
            timeout_seconds: 8,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LocalDirectoryConfig {
    pub enabled: bool,
    /// TOML price list published by the local supplier
    pub listing_path: PathBuf,
    pub timeout_seconds: u64,
}

impl Default for LocalDirectoryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listing_path: PathBuf::from("suppliers.toml"),
            timeout_seconds: 5,
        }
    }
}

/// Load configuration from the given TOML file (optional) layered with
/// `BUILDCOST__`-prefixed environment variables, then validate it.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let config = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(config::Environment::with_prefix("BUILDCOST").separator("__"))
        .build()?;

    let cfg: Config = config.try_deserialize()?;
    validate_config(&cfg)?;

    Ok(cfg)
}

fn validate_config(cfg: &Config) -> anyhow::Result<()> {
    if cfg.pricing.labor_rate < Decimal::ZERO {
        anyhow::bail!("labor_rate must not be negative");
    }
    if cfg.pricing.contingency_rate < Decimal::ZERO {
        anyhow::bail!("contingency_rate must not be negative");
    }
    if cfg.pricing.currency.is_empty() {
        anyhow::bail!("currency must not be empty");
    }
    if cfg.pricing.currency_precision > 8 {
        anyhow::bail!("currency_precision must be at most 8");
    }

    if cfg.cache.ttl_seconds == 0 {
        anyhow::bail!("cache ttl_seconds must be at least 1");
    }

    if cfg.resolution.concurrency_limit == 0 {
        anyhow::bail!("concurrency_limit must be at least 1");
    }
    if cfg.resolution.provider_priority.is_empty() {
        anyhow::bail!("provider_priority must name at least one provider");
    }

    // Priority entries must be known, unique, and reference enabled providers
    let mut seen = Vec::new();
    for name in &cfg.resolution.provider_priority {
        if seen.contains(&name.as_str()) {
            anyhow::bail!("provider '{}' listed more than once in provider_priority", name);
        }
        seen.push(name.as_str());

        match name.as_str() {
            MARKETPLACE_PROVIDER => {
                if !cfg.providers.marketplace.enabled {
                    anyhow::bail!(
                        "provider_priority names '{}', but the marketplace provider is disabled",
                        name
                    );
                }
                if cfg.providers.marketplace.base_url.is_empty() {
                    anyhow::bail!("marketplace provider requires a base_url");
                }
            }
            LOCAL_DIRECTORY_PROVIDER => {
                if !cfg.providers.local_directory.enabled {
                    anyhow::bail!(
                        "provider_priority names '{}', but the local directory provider is disabled",
                        name
                    );
                }
            }
            _ => anyhow::bail!("unknown provider in provider_priority: {}", name),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> Config {
        Config {
            pricing: PricingConfig::default(),
            cache: CacheConfig::default(),
            resolution: ResolutionConfig::default(),
            providers: ProvidersConfig {
                marketplace: MarketplaceConfig {
                    enabled: true,
                    base_url: "http://localhost:9000".to_string(),
                    timeout_seconds: 8,
                },
                local_directory: LocalDirectoryConfig {
                    enabled: true,
                    listing_path: PathBuf::from("suppliers.toml"),
                    timeout_seconds: 5,
                },
            },
        }
    }

    #[test]
    fn test_defaults_match_documented_rates() {
        let pricing = PricingConfig::default();
        assert_eq!(pricing.labor_rate, dec!(0.30));
        assert_eq!(pricing.contingency_rate, dec!(0.12));
        assert_eq!(pricing.currency_precision, 2);
        assert_eq!(CacheConfig::default().ttl_seconds, 86_400);
    }

    #[test]
    fn test_validate_config_accepts_valid() {
        assert!(validate_config(&create_test_config()).is_ok());
    }

    #[test]
    fn test_validate_config_rejects_disabled_priority_provider() {
        let mut cfg = create_test_config();
        cfg.providers.marketplace.enabled = false;

        let result = validate_config(&cfg);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("disabled"));
    }

    #[test]
    fn test_validate_config_rejects_unknown_provider() {
        let mut cfg = create_test_config();
        cfg.resolution.provider_priority = vec!["wholesale".to_string()];

        let result = validate_config(&cfg);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("unknown provider"));
    }

    #[test]
    fn test_validate_config_rejects_duplicate_priority_entry() {
        let mut cfg = create_test_config();
        cfg.resolution.provider_priority =
            vec![MARKETPLACE_PROVIDER.to_string(), MARKETPLACE_PROVIDER.to_string()];

        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn test_validate_config_rejects_empty_priority() {
        let mut cfg = create_test_config();
        cfg.resolution.provider_priority.clear();

        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn test_validate_config_rejects_zero_ttl() {
        let mut cfg = create_test_config();
        cfg.cache.ttl_seconds = 0;

        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn test_validate_config_rejects_negative_rate() {
        let mut cfg = create_test_config();
        cfg.pricing.labor_rate = dec!(-0.1);

        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn test_tie_break_deserializes_snake_case() {
        let cfg: ResolutionConfig =
            toml::from_str("provider_priority = [\"local_directory\"]\ntie_break = \"first_success\"\nconcurrency_limit = 2\nfailure_threshold = 0")
                .unwrap();
        assert_eq!(cfg.tie_break, TieBreak::FirstSuccess);
    }
}
