use super::domain::{CycleType, PricingCycle};
use crate::workflows::simulation::Rails;

pub const PRODUCTION_PERIOD_DAYS: u32 = 90;
pub const REQUIRED_USAGE_THRESHOLDS: [u32; 3] = [70, 90, 100];

/// Reasons a configuration may not be activated in production.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ActivationGateError {
    #[error("Production activation requires cycle_type=production and period_length_days=90")]
    CycleNotProduction,
    #[error(
        "Rails incomplete for production activation: monthly_spend_cap_usd must be a number >= 0"
    )]
    SpendCap,
    #[error(
        "Rails incomplete for production activation: margin_floor must be a number between 0 and 1 inclusive"
    )]
    MarginFloor,
    #[error(
        "Rails incomplete for production activation: usage_thresholds must include 70, 90 and 100 percent"
    )]
    UsageThresholds,
}

/// Checks run in order; the first failure is reported.
pub fn check_production_activation(
    cycle: &PricingCycle,
    rails: &Rails,
) -> Result<(), ActivationGateError> {
    if cycle.cycle_type != CycleType::Production
        || cycle.period_length_days != PRODUCTION_PERIOD_DAYS
    {
        return Err(ActivationGateError::CycleNotProduction);
    }

    match rails.monthly_spend_cap_usd {
        Some(cap) if cap.is_finite() && cap >= 0.0 => {}
        _ => return Err(ActivationGateError::SpendCap),
    }

    match rails.margin_floor {
        Some(floor) if floor.is_finite() && (0.0..=1.0).contains(&floor) => {}
        _ => return Err(ActivationGateError::MarginFloor),
    }

    let has_all_thresholds = REQUIRED_USAGE_THRESHOLDS.iter().all(|required| {
        rails
            .usage_thresholds
            .iter()
            .any(|threshold| threshold.percent == *required)
    });
    if !has_all_thresholds {
        return Err(ActivationGateError::UsageThresholds);
    }

    Ok(())
}
