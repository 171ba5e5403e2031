use std::collections::BTreeSet;
use thiserror::Error;

/// Provider-level failures. Never fatal individually; the resolution
/// fallback chain absorbs them by trying the next source or the cache.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Network failure, timeout, or an unreadable listing source
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// The source has no listing for this material
    #[error("no listing for material '{0}'")]
    NoListing(String),

    /// The source responded but its payload could not be parsed
    #[error("malformed listing data: {0}")]
    MalformedData(String),
}

/// Material-level failure: no source has ever produced a usable quote.
/// Unrecoverable without operator or configuration intervention.
#[derive(Debug, Error)]
pub enum PricingError {
    #[error("no price available for material '{0}' from any source")]
    PriceUnavailable(String),
}

/// Engine-level failure. Indicates an orchestration bug: the caller must
/// resolve prices for every material before invoking the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no resolved price for material '{0}'")]
    MissingPrice(String),
}

/// Run-level failures surfaced to the caller
#[derive(Debug, Error)]
pub enum PipelineError {
    /// One or more materials had no resolvable price. Carries the full set
    /// so the caller can see exactly which materials blocked the estimate.
    #[error("pricing failed for {} material(s): {}", .materials.len(), join_ids(.materials))]
    PricingFailed { materials: BTreeSet<String> },

    /// The collaborator contract was violated on input
    #[error("invalid quantity for material '{material_id}': {reason}")]
    InvalidQuantity { material_id: String, reason: String },

    #[error(transparent)]
    Engine(#[from] EngineError),
}

fn join_ids(materials: &BTreeSet<String>) -> String {
    materials.iter().cloned().collect::<Vec<_>>().join(", ")
}
