use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::super::domain::{CommitSemantics, PoolId, PricingMode, ValueUnitId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolBreakdownEntry {
    pub pool_id: PoolId,
    pub value_unit_id: ValueUnitId,
    pub total_units: f64,
    pub included_units: f64,
    pub overage_units: f64,
    pub avg_cost_per_unit_usd: f64,
    pub target_price_per_unit_usd: f64,
    pub cost_usd: f64,
    pub revenue_usd: f64,
    pub revenue_billed_usd: f64,
    pub revenue_commit_floor_usd: f64,
    pub revenue_usage_total_usd: f64,
    pub revenue_usage_overage_usd: f64,
    pub pricing_mode_used: PricingMode,
    pub commit_semantics_used: Option<CommitSemantics>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assumptions {
    pub segment_customer_count: u64,
    pub annual_churn_rate: f64,
    pub monthly_churn_rate: f64,
    pub annualization_factor: f64,
    pub churn_horizon_months: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EconomicsSummary {
    pub revenue_usd: f64,
    pub revenue_billed_usd: f64,
    pub revenue_commit_floor_usd_total: f64,
    pub revenue_usage_total_usd: f64,
    pub revenue_usage_overage_usd: f64,
    pub cost_usd: f64,
    pub margin: Option<f64>,
    pub margin_commit_floor: Option<f64>,
    pub revenue_annualized_usd: f64,
    pub cost_annualized_usd: f64,
    pub revenue_12mo_churn_adjusted_usd: f64,
    pub cost_12mo_churn_adjusted_usd: f64,
    pub revenue_commit_floor_annualized_usd: f64,
    pub revenue_commit_floor_12mo_churn_adjusted_usd: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assumptions: Option<Assumptions>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LensMetrics {
    pub exploration_depth: u64,
    pub margin_floor_violations: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExplorationSummary {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exploration_depth: Option<u64>,
}

/// Complete report of one simulation run, persisted verbatim by callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutput {
    #[serde(default)]
    pub primary_metric_deltas: BTreeMap<String, f64>,
    pub lens_metrics: LensMetrics,
    pub economics_summary: EconomicsSummary,
    pub pool_breakdown: Vec<PoolBreakdownEntry>,
    pub exploration_summary: ExplorationSummary,
    pub risks: Vec<String>,
    pub blocking_issues: Vec<String>,
    pub baseline_summary: Option<EconomicsSummary>,
}

/// Traffic-light readiness consumed by the approval workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletenessResult {
    Green,
    Amber,
    Red,
}

impl CompletenessResult {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Green => "Ready",
            Self::Amber => "Review Risks",
            Self::Red => "Blocked",
        }
    }
}
