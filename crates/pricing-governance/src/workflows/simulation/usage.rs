use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use super::domain::{
    AggregationKind, EventMapping, SimulationFilters, UsageEvent, ValueUnitDefinition, ValueUnitId,
};

/// Narrow the feed to the run's workspace and segment filters.
pub fn scope_events<'a>(events: &'a [UsageEvent], filters: &SimulationFilters) -> Vec<&'a UsageEvent> {
    events
        .iter()
        .filter(|event| match filters.workspace_id.as_deref() {
            Some(workspace) if !workspace.is_empty() => event.workspace_id() == Some(workspace),
            _ => true,
        })
        .filter(|event| match filters.segment.as_deref() {
            Some(segment) if !segment.is_empty() => event.segment() == Some(segment),
            _ => true,
        })
        .collect()
}

/// Meter one value unit against the scoped feed.
///
/// A mapping without an event type or aggregation kind meters zero, as does
/// a `sum` without a field.
pub fn resolve_quantity(mapping: &EventMapping, events: &[&UsageEvent]) -> f64 {
    let (Some(event_type), Some(kind)) = (
        mapping.event_type.as_deref(),
        mapping.aggregation.as_ref().and_then(|aggregation| aggregation.kind),
    ) else {
        return 0.0;
    };

    let matching = events
        .iter()
        .filter(|event| event.event_type() == Some(event_type))
        .filter(|event| matches_filters(event, &mapping.filters));

    match kind {
        AggregationKind::Count => matching.count() as f64,
        AggregationKind::Sum => {
            let Some(field) = mapping
                .aggregation
                .as_ref()
                .and_then(|aggregation| aggregation.field.as_deref())
            else {
                return 0.0;
            };
            matching
                .map(|event| numeric_value(event.field(field)))
                .sum()
        }
        AggregationKind::Unsupported => 0.0,
    }
}

/// Meter every value unit in a definition set, keyed by id.
pub fn resolve_usage(
    value_units: &[ValueUnitDefinition],
    events: &[&UsageEvent],
) -> HashMap<ValueUnitId, f64> {
    value_units
        .iter()
        .map(|unit| {
            (
                unit.value_unit_id.clone(),
                resolve_quantity(&unit.event_mapping, events),
            )
        })
        .collect()
}

/// Count events whose type is in the qualifying set.
pub fn count_event_types(events: &[&UsageEvent], qualifying: &[String]) -> u64 {
    events
        .iter()
        .filter(|event| {
            event
                .event_type()
                .map(|event_type| qualifying.iter().any(|candidate| candidate == event_type))
                .unwrap_or(false)
        })
        .count() as u64
}

pub(crate) fn matches_filters(event: &UsageEvent, filters: &BTreeMap<String, Value>) -> bool {
    filters.iter().all(|(field, expected)| {
        if expected.is_null() {
            return true;
        }
        event
            .field(field)
            .map(|actual| values_equal(actual, expected))
            .unwrap_or(false)
    })
}

// Numbers compare by value so `5` and `5.0` match, and a numeric CSV cell
// still matches a filter written as a string.
fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(left), Value::Number(right)) => left.as_f64() == right.as_f64(),
        (Value::Number(number), Value::String(text))
        | (Value::String(text), Value::Number(number)) => {
            text.trim().parse::<f64>().ok() == number.as_f64()
        }
        _ => actual == expected,
    }
}

// Non-numeric and missing values contribute nothing to a sum.
fn numeric_value(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(raw)) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                Some(0.0)
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        Some(Value::Bool(flag)) => Some(if *flag { 1.0 } else { 0.0 }),
        _ => None,
    };

    parsed.filter(|number| number.is_finite()).unwrap_or(0.0)
}
