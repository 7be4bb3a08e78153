use serde::Serialize;

use super::super::economics::EconomicsTotals;
use super::super::projection::{ChurnAssumptions, Projection};
use super::views::{Assumptions, CompletenessResult, EconomicsSummary, SimulationOutput};

impl EconomicsSummary {
    pub fn from_totals(
        totals: &EconomicsTotals,
        projection: &Projection,
        assumptions: Option<Assumptions>,
    ) -> Self {
        Self {
            revenue_usd: totals.revenue_billed_usd,
            revenue_billed_usd: totals.revenue_billed_usd,
            revenue_commit_floor_usd_total: totals.revenue_commit_floor_usd,
            revenue_usage_total_usd: totals.revenue_usage_total_usd,
            revenue_usage_overage_usd: totals.revenue_usage_overage_usd,
            cost_usd: totals.cost_usd,
            margin: totals.margin(),
            margin_commit_floor: totals.margin_commit_floor(),
            revenue_annualized_usd: projection.revenue_annualized_usd,
            cost_annualized_usd: projection.cost_annualized_usd,
            revenue_12mo_churn_adjusted_usd: projection.revenue_churn_adjusted_usd,
            cost_12mo_churn_adjusted_usd: projection.cost_churn_adjusted_usd,
            revenue_commit_floor_annualized_usd: projection.revenue_commit_floor_annualized_usd,
            revenue_commit_floor_12mo_churn_adjusted_usd: projection
                .revenue_commit_floor_churn_adjusted_usd,
            assumptions,
        }
    }
}

impl Assumptions {
    pub fn from_churn(churn: &ChurnAssumptions, segment_customer_count: u64) -> Self {
        Self {
            segment_customer_count,
            annual_churn_rate: churn.annual_churn_rate,
            monthly_churn_rate: churn.monthly_churn_rate,
            annualization_factor: churn.annualization_factor,
            churn_horizon_months: churn.churn_horizon_months,
        }
    }
}

/// Candidate minus baseline for the headline figures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BaselineComparison {
    pub revenue_delta_usd: f64,
    pub cost_delta_usd: f64,
    pub revenue_annualized_delta_usd: f64,
    pub revenue_churn_adjusted_delta_usd: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin_delta: Option<f64>,
}

impl SimulationOutput {
    /// Red when any pool is blocked, amber when only rails fired, green otherwise.
    pub fn completeness(&self) -> CompletenessResult {
        if !self.blocking_issues.is_empty() {
            CompletenessResult::Red
        } else if !self.risks.is_empty() {
            CompletenessResult::Amber
        } else {
            CompletenessResult::Green
        }
    }

    pub fn baseline_comparison(&self) -> Option<BaselineComparison> {
        let baseline = self.baseline_summary.as_ref()?;
        let candidate = &self.economics_summary;

        let margin_delta = match (candidate.margin, baseline.margin) {
            (Some(current), Some(previous)) => Some(current - previous),
            _ => None,
        };

        Some(BaselineComparison {
            revenue_delta_usd: candidate.revenue_billed_usd - baseline.revenue_billed_usd,
            cost_delta_usd: candidate.cost_usd - baseline.cost_usd,
            revenue_annualized_delta_usd: candidate.revenue_annualized_usd
                - baseline.revenue_annualized_usd,
            revenue_churn_adjusted_delta_usd: candidate.revenue_12mo_churn_adjusted_usd
                - baseline.revenue_12mo_churn_adjusted_usd,
            margin_delta,
        })
    }
}
