use super::domain::{
    CommitSemantics, PoolId, PricingMode, UsagePool, ValueUnitDefinition, ValueUnitId,
};
use super::params::SimulationParameters;
use super::report::PoolBreakdownEntry;

/// Structural problem that keeps a pool out of the economics.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PoolIssue {
    #[error("Pool references missing value_unit_id: {value_unit_id}")]
    MissingValueUnit {
        pool_id: PoolId,
        value_unit_id: ValueUnitId,
    },
    #[error("Missing unit_economics.avg_cost_per_unit_usd for {0}")]
    InvalidCost(ValueUnitId),
    #[error("Missing unit_economics.target_price_per_unit_usd for {0}")]
    InvalidPrice(ValueUnitId),
}

/// Validated per-unit cost and price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitRates {
    pub cost_per_unit: f64,
    pub price_per_unit: f64,
}

impl UnitRates {
    /// Both rates must be present, finite and non-negative.
    pub fn validated(unit: &ValueUnitDefinition) -> Result<Self, PoolIssue> {
        let economics = unit.unit_economics.unwrap_or_default();

        let cost_per_unit = economics
            .avg_cost_per_unit_usd
            .filter(|cost| cost.is_finite() && *cost >= 0.0)
            .ok_or_else(|| PoolIssue::InvalidCost(unit.value_unit_id.clone()))?;
        let price_per_unit = economics
            .target_price_per_unit_usd
            .filter(|price| price.is_finite() && *price >= 0.0)
            .ok_or_else(|| PoolIssue::InvalidPrice(unit.value_unit_id.clone()))?;

        Ok(Self {
            cost_per_unit,
            price_per_unit,
        })
    }

    /// Baseline comparisons price whatever is there, treating absent or
    /// non-finite rates as zero.
    pub fn lenient(unit: &ValueUnitDefinition) -> Self {
        let economics = unit.unit_economics.unwrap_or_default();
        let finite_or_zero = |value: Option<f64>| value.filter(|v| v.is_finite()).unwrap_or(0.0);

        Self {
            cost_per_unit: finite_or_zero(economics.avg_cost_per_unit_usd),
            price_per_unit: finite_or_zero(economics.target_price_per_unit_usd),
        }
    }
}

/// Pricing mode and commit semantics in force for a single pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolPricing {
    pub pricing_mode: PricingMode,
    /// Only set when the pool is priced under `revenue_proxy_commit`.
    pub commit_semantics: Option<CommitSemantics>,
}

impl PoolPricing {
    pub fn resolve(pool_id: &PoolId, params: &SimulationParameters) -> Self {
        let pricing_mode = params.pricing_mode_for(pool_id);
        let commit_semantics = match pricing_mode {
            PricingMode::RevenueProxyCommit => Some(params.commit_semantics_for(pool_id)),
            _ => None,
        };

        Self {
            pricing_mode,
            commit_semantics,
        }
    }

    pub fn billed_revenue(&self, revenue: &RevenueComponents) -> f64 {
        match self.pricing_mode {
            PricingMode::UseUnitEconomics => revenue.usage_overage,
            PricingMode::RevenueProxyTotal => revenue.usage_total,
            PricingMode::RevenueProxyCommit => match self.commit_semantics {
                Some(CommitSemantics::EntitlementOnly) => revenue.usage_total,
                // Unset semantics bill against the floor.
                Some(CommitSemantics::CommitFloor) | None => {
                    revenue.commit_floor.max(revenue.usage_total)
                }
            },
        }
    }
}

/// Diagnostic revenue figures computed for every pool regardless of mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevenueComponents {
    pub usage_total: f64,
    pub usage_overage: f64,
    pub commit_floor: f64,
}

impl RevenueComponents {
    pub fn compute(total_units: f64, included_units: f64, overage_units: f64, price: f64) -> Self {
        Self {
            usage_total: total_units * price,
            usage_overage: overage_units * price,
            commit_floor: included_units * price,
        }
    }
}

/// Price one pool from its metered quantity. Cost is always usage based.
pub fn price_pool(
    pool: &UsagePool,
    rates: UnitRates,
    total_units: f64,
    pricing: PoolPricing,
) -> PoolBreakdownEntry {
    let included_units = pool.included_quantity;
    let overage_units = (total_units - included_units).max(0.0);
    let revenue = RevenueComponents::compute(
        total_units,
        included_units,
        overage_units,
        rates.price_per_unit,
    );
    let billed = pricing.billed_revenue(&revenue);
    let commit_floor = match pricing.pricing_mode {
        PricingMode::RevenueProxyCommit => revenue.commit_floor,
        _ => 0.0,
    };

    PoolBreakdownEntry {
        pool_id: pool.pool_id.clone(),
        value_unit_id: pool.value_unit_id.clone(),
        total_units,
        included_units,
        overage_units,
        avg_cost_per_unit_usd: rates.cost_per_unit,
        target_price_per_unit_usd: rates.price_per_unit,
        cost_usd: total_units * rates.cost_per_unit,
        revenue_usd: billed,
        revenue_billed_usd: billed,
        revenue_commit_floor_usd: commit_floor,
        revenue_usage_total_usd: revenue.usage_total,
        revenue_usage_overage_usd: revenue.usage_overage,
        pricing_mode_used: pricing.pricing_mode,
        commit_semantics_used: pricing.commit_semantics,
    }
}
