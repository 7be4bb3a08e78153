use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use super::domain::{ConfigurationSnapshot, UsageEvent, ValueUnitDefinition, ValueUnitId};
use super::economics::EconomicsTotals;
use super::params::SimulationParameters;
use super::pricing::{price_pool, PoolIssue, PoolPricing, UnitRates};
use super::projection::{ChurnAssumptions, Projection};
use super::report::{
    Assumptions, EconomicsSummary, ExplorationSummary, LensMetrics, PoolBreakdownEntry,
    SimulationOutput,
};
use super::risk::{evaluate_rails, exploration_depth};
use super::usage::{resolve_usage, scope_events};

/// A configuration snapshot together with the value units it is priced against.
#[derive(Debug, Clone, Copy)]
pub struct PricingScenario<'a> {
    pub snapshot: &'a ConfigurationSnapshot,
    pub value_units: &'a [ValueUnitDefinition],
}

impl<'a> PricingScenario<'a> {
    pub fn new(
        snapshot: &'a ConfigurationSnapshot,
        value_units: &'a [ValueUnitDefinition],
    ) -> Self {
        Self {
            snapshot,
            value_units,
        }
    }
}

/// Which validation a pricing pass applies to unit economics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PassKind {
    /// Invalid pools are reported as blocking issues.
    Candidate,
    /// Invalid pools are skipped or priced at zero without reporting.
    Baseline,
}

#[derive(Debug, Default)]
struct PricingPass {
    pool_breakdown: Vec<PoolBreakdownEntry>,
    issues: Vec<PoolIssue>,
    totals: EconomicsTotals,
}

/// Stateless simulator applying one set of run parameters to pricing scenarios.
///
/// Runs never mutate their inputs, so one engine can serve concurrent
/// simulations over the same feed.
#[derive(Debug, Clone)]
pub struct SimulationEngine {
    params: SimulationParameters,
}

impl SimulationEngine {
    pub fn new(params: SimulationParameters) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &SimulationParameters {
        &self.params
    }

    pub fn run(
        &self,
        candidate: PricingScenario<'_>,
        baseline: Option<PricingScenario<'_>>,
        events: &[UsageEvent],
    ) -> SimulationOutput {
        let params = &self.params;
        let events = scope_events(events, &params.filters);
        let churn = ChurnAssumptions::resolve(
            params.filters.lifecycle_stage(),
            params.historical_window_days,
            params.annual_churn_rate,
            params.churn_horizon_months,
        );

        let pass = self.price(candidate, &events, PassKind::Candidate);
        let totals = pass.totals.scaled(params.segment_customer_count);
        let margin = totals.margin();
        let rails = evaluate_rails(&candidate.snapshot.rails, margin, totals.cost_usd);

        let exploration = &candidate.snapshot.exploration;
        let depth = exploration_depth(exploration, params.include_exploration_in_results, &events);
        let exploration_summary = if params.include_exploration_in_results {
            ExplorationSummary {
                enabled: exploration.enabled,
                exploration_depth: Some(depth),
            }
        } else {
            ExplorationSummary::default()
        };

        let economics_summary = EconomicsSummary::from_totals(
            &totals,
            &Projection::project(&totals, &churn),
            Some(Assumptions::from_churn(&churn, params.segment_customer_count)),
        );

        let baseline_summary = baseline.map(|scenario| {
            let pass = self.price(scenario, &events, PassKind::Baseline);
            let totals = pass.totals.scaled(params.segment_customer_count);
            EconomicsSummary::from_totals(&totals, &Projection::project(&totals, &churn), None)
        });

        debug!(
            events = events.len(),
            pools = pass.pool_breakdown.len(),
            blocking = pass.issues.len(),
            risks = rails.risks.len(),
            baseline = baseline_summary.is_some(),
            "simulation completed"
        );

        SimulationOutput {
            primary_metric_deltas: BTreeMap::new(),
            lens_metrics: LensMetrics {
                exploration_depth: depth,
                margin_floor_violations: rails.margin_floor_violations,
            },
            economics_summary,
            pool_breakdown: pass.pool_breakdown,
            exploration_summary,
            risks: rails.risks,
            blocking_issues: pass.issues.iter().map(ToString::to_string).collect(),
            baseline_summary,
        }
    }

    fn price(
        &self,
        scenario: PricingScenario<'_>,
        events: &[&UsageEvent],
        kind: PassKind,
    ) -> PricingPass {
        let usage = resolve_usage(scenario.value_units, events);
        let units: HashMap<&ValueUnitId, &ValueUnitDefinition> = scenario
            .value_units
            .iter()
            .map(|unit| (&unit.value_unit_id, unit))
            .collect();

        let mut pass = PricingPass::default();
        for pool in &scenario.snapshot.pools {
            let Some(unit) = units.get(&pool.value_unit_id) else {
                debug!(
                    pool_id = %pool.pool_id,
                    value_unit_id = %pool.value_unit_id,
                    "pool skipped: unknown value unit"
                );
                if kind == PassKind::Candidate {
                    pass.issues.push(PoolIssue::MissingValueUnit {
                        pool_id: pool.pool_id.clone(),
                        value_unit_id: pool.value_unit_id.clone(),
                    });
                }
                continue;
            };

            let rates = match kind {
                PassKind::Candidate => match UnitRates::validated(unit) {
                    Ok(rates) => rates,
                    Err(issue) => {
                        debug!(
                            pool_id = %pool.pool_id,
                            %issue,
                            "pool skipped: invalid unit economics"
                        );
                        pass.issues.push(issue);
                        continue;
                    }
                },
                PassKind::Baseline => UnitRates::lenient(unit),
            };

            let total_units = usage.get(&unit.value_unit_id).copied().unwrap_or(0.0);
            let pricing = PoolPricing::resolve(&pool.pool_id, &self.params);
            let entry = price_pool(pool, rates, total_units, pricing);

            pass.totals.add(&entry);
            pass.pool_breakdown.push(entry);
        }

        pass
    }
}
