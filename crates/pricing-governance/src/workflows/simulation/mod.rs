//! Pricing simulation: meters historical usage against a configuration
//! snapshot and reports billed economics, projections and rail signals.
//!
//! Stages run strictly in order: usage resolution, pool pricing, aggregation,
//! projection, risk evaluation. A baseline snapshot, when supplied, repeats
//! the first four stages with the same feed and scaling.

pub mod domain;
mod economics;
mod engine;
mod feed;
mod params;
mod pricing;
mod projection;
pub mod report;
mod risk;
mod scenario;
pub mod usage;

#[cfg(test)]
mod tests;

pub use domain::{
    Aggregation, AggregationKind, CommitSemantics, ConfigurationSnapshot, EventMapping,
    ExplorationConfig, LifecycleStage, PoolId, PricingMode, Rails, SimulationFilters,
    UnitEconomics, UsageEvent, UsagePool, UsageThreshold, ValueUnitDefinition, ValueUnitId,
};
pub use economics::{margin_ratio, EconomicsTotals, MARGIN_EPSILON};
pub use engine::{PricingScenario, SimulationEngine};
pub use feed::{UsageFeed, UsageFeedError};
pub use params::{SimulationParameters, SimulationRequestError, SimulationSettingsRequest};
pub use pricing::{price_pool, PoolIssue, PoolPricing, RevenueComponents, UnitRates};
pub use projection::{
    default_annual_churn, retention_sum, ChurnAssumptions, Projection,
    DEFAULT_CHURN_HORIZON_MONTHS,
};
pub use report::{
    BaselineComparison, CompletenessResult, EconomicsSummary, PoolBreakdownEntry,
    SimulationOutput,
};
pub use risk::{evaluate_rails, exploration_depth, RailAssessment};
pub use scenario::{SimulationReport, SimulationScenario};
