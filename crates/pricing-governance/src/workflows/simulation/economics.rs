use super::domain::PricingMode;
use super::report::PoolBreakdownEntry;

/// Smallest denominator used for margin ratios.
pub const MARGIN_EPSILON: f64 = 1e-9;

/// Config-level sums of the priced pools.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EconomicsTotals {
    pub revenue_billed_usd: f64,
    pub revenue_commit_floor_usd: f64,
    pub revenue_usage_total_usd: f64,
    pub revenue_usage_overage_usd: f64,
    pub cost_usd: f64,
}

impl EconomicsTotals {
    pub fn add(&mut self, entry: &PoolBreakdownEntry) {
        self.revenue_billed_usd += entry.revenue_billed_usd;
        self.cost_usd += entry.cost_usd;
        if entry.pricing_mode_used == PricingMode::RevenueProxyCommit {
            self.revenue_commit_floor_usd += entry.revenue_commit_floor_usd;
        }
        self.revenue_usage_total_usd += entry.revenue_usage_total_usd;
        self.revenue_usage_overage_usd += entry.revenue_usage_overage_usd;
    }

    /// Scale every sum by the number of customers the sample stands for.
    pub fn scaled(self, segment_customer_count: u64) -> Self {
        let factor = segment_customer_count.max(1) as f64;
        Self {
            revenue_billed_usd: self.revenue_billed_usd * factor,
            revenue_commit_floor_usd: self.revenue_commit_floor_usd * factor,
            revenue_usage_total_usd: self.revenue_usage_total_usd * factor,
            revenue_usage_overage_usd: self.revenue_usage_overage_usd * factor,
            cost_usd: self.cost_usd * factor,
        }
    }

    /// Margin on billed revenue; `None` when nothing was billed.
    pub fn margin(&self) -> Option<f64> {
        if self.revenue_billed_usd == 0.0 {
            None
        } else {
            Some(margin_ratio(self.revenue_billed_usd, self.cost_usd))
        }
    }

    /// Margin against the committed contract value; `None` without a positive floor.
    pub fn margin_commit_floor(&self) -> Option<f64> {
        if self.revenue_commit_floor_usd > 0.0 {
            Some(margin_ratio(self.revenue_commit_floor_usd, self.cost_usd))
        } else {
            None
        }
    }
}

impl<'a> FromIterator<&'a PoolBreakdownEntry> for EconomicsTotals {
    fn from_iter<I: IntoIterator<Item = &'a PoolBreakdownEntry>>(iter: I) -> Self {
        let mut totals = Self::default();
        for entry in iter {
            totals.add(entry);
        }
        totals
    }
}

pub fn margin_ratio(revenue: f64, cost: f64) -> f64 {
    (revenue - cost) / revenue.max(MARGIN_EPSILON)
}
