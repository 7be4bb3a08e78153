use super::domain::LifecycleStage;
use super::economics::EconomicsTotals;

pub const DEFAULT_CHURN_HORIZON_MONTHS: u32 = 12;
const DAYS_PER_YEAR: f64 = 365.0;
const DAYS_PER_MONTH: f64 = 30.0;

/// Annual churn assumed when the run does not override it.
pub const fn default_annual_churn(stage: Option<LifecycleStage>) -> f64 {
    match stage {
        Some(LifecycleStage::Scaling) => 0.25,
        Some(LifecycleStage::Learning) | None => 0.50,
    }
}

/// Resolved churn and annualization inputs shared by candidate and baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChurnAssumptions {
    pub annual_churn_rate: f64,
    pub monthly_churn_rate: f64,
    pub retention_sum: f64,
    pub annualization_factor: f64,
    pub churn_horizon_months: u32,
    pub historical_window_days: f64,
}

impl ChurnAssumptions {
    pub fn resolve(
        stage: Option<LifecycleStage>,
        historical_window_days: f64,
        annual_churn_override: Option<f64>,
        churn_horizon_months: u32,
    ) -> Self {
        let annual_churn_rate = annual_churn_override.unwrap_or(default_annual_churn(stage));
        let monthly_churn_rate = 1.0 - (1.0 - annual_churn_rate).powf(1.0 / 12.0);

        Self {
            annual_churn_rate,
            monthly_churn_rate,
            retention_sum: retention_sum(1.0 - monthly_churn_rate, churn_horizon_months),
            annualization_factor: DAYS_PER_YEAR / historical_window_days,
            churn_horizon_months,
            historical_window_days,
        }
    }

    pub fn annualize(&self, amount: f64) -> f64 {
        amount * self.annualization_factor
    }

    /// Monthly run-rate of `amount` carried over the horizon with decaying retention.
    pub fn churn_adjust(&self, amount: f64) -> f64 {
        amount * (DAYS_PER_MONTH / self.historical_window_days) * self.retention_sum
    }
}

/// Geometric sum `1 + r + ... + r^(h-1)` of retained monthly revenue.
pub fn retention_sum(retention: f64, horizon_months: u32) -> f64 {
    if retention == 1.0 {
        f64::from(horizon_months)
    } else {
        (1.0 - retention.powi(horizon_months as i32)) / (1.0 - retention)
    }
}

/// Advisory forward-looking figures derived from the observation window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Projection {
    pub revenue_annualized_usd: f64,
    pub cost_annualized_usd: f64,
    pub revenue_churn_adjusted_usd: f64,
    pub cost_churn_adjusted_usd: f64,
    pub revenue_commit_floor_annualized_usd: f64,
    pub revenue_commit_floor_churn_adjusted_usd: f64,
}

impl Projection {
    pub fn project(totals: &EconomicsTotals, assumptions: &ChurnAssumptions) -> Self {
        Self {
            revenue_annualized_usd: assumptions.annualize(totals.revenue_billed_usd),
            cost_annualized_usd: assumptions.annualize(totals.cost_usd),
            revenue_churn_adjusted_usd: assumptions.churn_adjust(totals.revenue_billed_usd),
            cost_churn_adjusted_usd: assumptions.churn_adjust(totals.cost_usd),
            revenue_commit_floor_annualized_usd: assumptions
                .annualize(totals.revenue_commit_floor_usd),
            revenue_commit_floor_churn_adjusted_usd: assumptions
                .churn_adjust(totals.revenue_commit_floor_usd),
        }
    }
}
