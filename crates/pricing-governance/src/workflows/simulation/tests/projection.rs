use super::common::*;
use crate::workflows::simulation::domain::LifecycleStage;
use crate::workflows::simulation::{
    default_annual_churn, retention_sum, ChurnAssumptions, PricingMode, PricingScenario,
    SimulationEngine,
};

#[test]
fn stage_selects_default_churn() {
    assert_eq!(default_annual_churn(Some(LifecycleStage::Scaling)), 0.25);
    assert_eq!(default_annual_churn(Some(LifecycleStage::Learning)), 0.5);
    assert_eq!(default_annual_churn(None), 0.5);
}

#[test]
fn scaling_stage_churn_over_a_year() {
    let churn = ChurnAssumptions::resolve(Some(LifecycleStage::Scaling), 30.0, None, 12);

    assert_close(churn.monthly_churn_rate, 0.0236884);
    assert_close((churn.retention_sum * 1e4).round() / 1e4, 10.5537);
    assert_close(churn.annualization_factor, 365.0 / 30.0);
}

#[test]
fn zero_churn_retains_the_full_horizon() {
    let churn = ChurnAssumptions::resolve(None, 30.0, Some(0.0), 24);
    assert_eq!(churn.monthly_churn_rate, 0.0);
    assert_eq!(churn.retention_sum, 24.0);
}

#[test]
fn total_churn_keeps_only_the_first_month() {
    let churn = ChurnAssumptions::resolve(None, 30.0, Some(1.0), 12);
    assert_eq!(churn.monthly_churn_rate, 1.0);
    assert_eq!(churn.retention_sum, 1.0);
}

#[test]
fn single_month_horizon_sums_to_one() {
    assert_eq!(retention_sum(0.9, 1), 1.0);
    assert_close(retention_sum(0.9, 2), 1.9);
}

#[test]
fn projections_follow_window_and_retention() {
    let snapshot = render_snapshot(100.0);
    let units = vec![render_unit(1.0, 2.0)];
    let params = params_with_mode(PricingMode::RevenueProxyTotal).with_filters(scaling_filters());

    let output = SimulationEngine::new(params).run(
        PricingScenario::new(&snapshot, &units),
        None,
        &renders(150),
    );

    let summary = &output.economics_summary;
    let churn = ChurnAssumptions::resolve(Some(LifecycleStage::Scaling), 30.0, None, 12);
    assert_close(summary.revenue_annualized_usd, 300.0 * 365.0 / 30.0);
    assert_close(summary.cost_annualized_usd, 150.0 * 365.0 / 30.0);
    assert_close(
        summary.revenue_12mo_churn_adjusted_usd,
        300.0 * churn.retention_sum,
    );
    assert_eq!(summary.revenue_commit_floor_annualized_usd, 0.0);

    let assumptions = summary.assumptions.as_ref().expect("candidate assumptions");
    assert_eq!(assumptions.annual_churn_rate, 0.25);
    assert_eq!(assumptions.churn_horizon_months, 12);
}

#[test]
fn annual_churn_override_beats_stage_default() {
    let churn = ChurnAssumptions::resolve(Some(LifecycleStage::Learning), 90.0, Some(0.1), 6);
    assert_eq!(churn.annual_churn_rate, 0.1);
    assert_eq!(churn.churn_horizon_months, 6);
    assert_close(churn.churn_adjust(90.0), 30.0 * churn.retention_sum);
}
