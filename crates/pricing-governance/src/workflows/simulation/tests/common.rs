use crate::workflows::simulation::domain::{
    ConfigurationSnapshot, EventMapping, ExplorationConfig, PoolId, Rails, SimulationFilters,
    UnitEconomics, UsageEvent, UsagePool, ValueUnitDefinition, ValueUnitId,
};
use crate::workflows::simulation::{PricingMode, SimulationParameters};

pub(super) const RENDER_UNIT: &str = "vu_render_minutes";
pub(super) const RENDER_POOL: &str = "pool_render";

pub(super) fn render_unit(cost: f64, price: f64) -> ValueUnitDefinition {
    ValueUnitDefinition {
        value_unit_id: ValueUnitId(RENDER_UNIT.to_string()),
        name: Some("Render minutes".to_string()),
        unit_type: Some("minutes".to_string()),
        event_mapping: EventMapping::count("render_completed"),
        unit_economics: Some(UnitEconomics::new(cost, price)),
    }
}

pub(super) fn pool(pool_id: &str, value_unit_id: &str, included_quantity: f64) -> UsagePool {
    UsagePool {
        pool_id: PoolId(pool_id.to_string()),
        value_unit_id: ValueUnitId(value_unit_id.to_string()),
        included_quantity,
    }
}

pub(super) fn render_snapshot(included_quantity: f64) -> ConfigurationSnapshot {
    ConfigurationSnapshot {
        pools: vec![pool(RENDER_POOL, RENDER_UNIT, included_quantity)],
        exploration: ExplorationConfig::default(),
        rails: Rails::default(),
    }
}

pub(super) fn renders(count: usize) -> Vec<UsageEvent> {
    (0..count)
        .map(|_| {
            UsageEvent::of_type("render_completed")
                .with("workspace_id", "ws_1049")
                .with("segment", "ai_video_smb")
        })
        .collect()
}

/// Thirty-day window with no filters and the default pricing mode.
pub(super) fn params() -> SimulationParameters {
    SimulationParameters::new(30.0)
}

pub(super) fn params_with_mode(mode: PricingMode) -> SimulationParameters {
    params().with_pricing_mode(mode)
}

pub(super) fn scaling_filters() -> SimulationFilters {
    SimulationFilters {
        stage: Some("scaling".to_string()),
        ..SimulationFilters::default()
    }
}

pub(super) fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}
