use super::domain::{ExplorationConfig, Rails, UsageEvent};
use super::usage::count_event_types;

const MARGIN_FLOOR_PREFIX: &str = "margin_floor violated";

/// Advisory rail findings for the candidate economics.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RailAssessment {
    pub risks: Vec<String>,
    pub margin_floor_violations: u32,
}

/// Compare aggregate margin and cost against the configured rails.
///
/// A `None` margin (nothing billed) never trips the margin floor.
pub fn evaluate_rails(rails: &Rails, margin: Option<f64>, cost_usd: f64) -> RailAssessment {
    let mut assessment = RailAssessment::default();

    if let (Some(margin), Some(floor)) = (margin, rails.margin_floor) {
        if margin < floor {
            assessment
                .risks
                .push(format!("{MARGIN_FLOOR_PREFIX}: margin={margin:.3} < {floor}"));
            assessment.margin_floor_violations = 1;
        }
    }

    if let Some(cap) = rails.monthly_spend_cap_usd {
        if cost_usd > cap {
            assessment
                .risks
                .push(format!("spend cap exceeded: cost_usd={cost_usd:.2} > {cap}"));
        }
    }

    assessment
}

/// Events of a qualifying type, counted only when exploration is both
/// enabled on the config and requested for the run.
pub fn exploration_depth(
    exploration: &ExplorationConfig,
    include_in_results: bool,
    events: &[&UsageEvent],
) -> u64 {
    if include_in_results && exploration.enabled {
        count_event_types(events, &exploration.qualifying_events)
    } else {
        0
    }
}
