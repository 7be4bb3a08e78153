use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier wrapper for value-unit definitions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ValueUnitId(pub String);

/// Identifier wrapper for usage pools inside a configuration snapshot.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PoolId(pub String);

impl fmt::Display for ValueUnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw usage event as exported by the metering pipeline.
///
/// Only `event_type`, `workspace_id` and `segment` carry meaning for the
/// engine; every other field is available to event-mapping filters and `sum`
/// aggregations.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsageEvent(Map<String, Value>);

impl UsageEvent {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn of_type(event_type: &str) -> Self {
        Self::default().with("event_type", event_type)
    }

    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.0.insert(field.to_string(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn event_type(&self) -> Option<&str> {
        self.0.get("event_type").and_then(Value::as_str)
    }

    pub fn workspace_id(&self) -> Option<&str> {
        self.0.get("workspace_id").and_then(Value::as_str)
    }

    pub fn segment(&self) -> Option<&str> {
        self.0.get("segment").and_then(Value::as_str)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// How matching events collapse into a single metered quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationKind {
    Count,
    Sum,
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Aggregation {
    #[serde(rename = "type", default)]
    pub kind: Option<AggregationKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// Rule translating raw events into a value-unit quantity.
///
/// Every part is optional on the wire: an incomplete mapping meters zero
/// rather than failing the run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EventMapping {
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub filters: BTreeMap<String, Value>,
    #[serde(default)]
    pub aggregation: Option<Aggregation>,
}

impl EventMapping {
    pub fn count(event_type: &str) -> Self {
        Self {
            event_type: Some(event_type.to_string()),
            filters: BTreeMap::new(),
            aggregation: Some(Aggregation {
                kind: Some(AggregationKind::Count),
                field: None,
            }),
        }
    }

    pub fn sum(event_type: &str, field: &str) -> Self {
        Self {
            event_type: Some(event_type.to_string()),
            filters: BTreeMap::new(),
            aggregation: Some(Aggregation {
                kind: Some(AggregationKind::Sum),
                field: Some(field.to_string()),
            }),
        }
    }

    pub fn with_filter(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.insert(field.to_string(), value.into());
        self
    }
}

/// Per-unit cost and target price in USD. Validated when a pool is priced.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct UnitEconomics {
    #[serde(default)]
    pub avg_cost_per_unit_usd: Option<f64>,
    #[serde(default)]
    pub target_price_per_unit_usd: Option<f64>,
}

impl UnitEconomics {
    pub fn new(avg_cost_per_unit_usd: f64, target_price_per_unit_usd: f64) -> Self {
        Self {
            avg_cost_per_unit_usd: Some(avg_cost_per_unit_usd),
            target_price_per_unit_usd: Some(target_price_per_unit_usd),
        }
    }
}

/// Billable unit of product usage owned by a pricing cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueUnitDefinition {
    pub value_unit_id: ValueUnitId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_type: Option<String>,
    #[serde(default)]
    pub event_mapping: EventMapping,
    #[serde(default)]
    pub unit_economics: Option<UnitEconomics>,
}

/// Allotment of one value unit with its included ("commit") quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsagePool {
    pub pool_id: PoolId,
    pub value_unit_id: ValueUnitId,
    #[serde(default)]
    pub included_quantity: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExplorationConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub qualifying_events: Vec<String>,
}

/// Usage alert threshold expressed as a percentage of the included quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageThreshold {
    pub percent: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

/// Guardrails evaluated against simulated economics.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Rails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin_floor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_spend_cap_usd: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub usage_thresholds: Vec<UsageThreshold>,
}

/// Pools, exploration rules and rails of one configuration version.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConfigurationSnapshot {
    #[serde(default)]
    pub pools: Vec<UsagePool>,
    #[serde(default)]
    pub exploration: ExplorationConfig,
    #[serde(default)]
    pub rails: Rails,
}

/// Rule used to turn metered usage into billed revenue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingMode {
    #[default]
    UseUnitEconomics,
    RevenueProxyTotal,
    RevenueProxyCommit,
}

impl PricingMode {
    pub const ALL: [Self; 3] = [
        Self::UseUnitEconomics,
        Self::RevenueProxyTotal,
        Self::RevenueProxyCommit,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UseUnitEconomics => "use_unit_economics",
            Self::RevenueProxyTotal => "revenue_proxy_total",
            Self::RevenueProxyCommit => "revenue_proxy_commit",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::UseUnitEconomics => "Overage at unit price",
            Self::RevenueProxyTotal => "All usage at unit price",
            Self::RevenueProxyCommit => "Commit-aware usage",
        }
    }
}

impl FromStr for PricingMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == value)
            .ok_or_else(|| value.to_string())
    }
}

/// How a committed quantity interacts with billing under `revenue_proxy_commit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitSemantics {
    #[default]
    CommitFloor,
    EntitlementOnly,
}

impl CommitSemantics {
    pub const ALL: [Self; 2] = [Self::CommitFloor, Self::EntitlementOnly];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CommitFloor => "commit_floor",
            Self::EntitlementOnly => "entitlement_only",
        }
    }
}

impl FromStr for CommitSemantics {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|semantics| semantics.as_str() == value)
            .ok_or_else(|| value.to_string())
    }
}

/// Lifecycle stage of a pricing subject; drives the default churn assumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStage {
    Learning,
    Scaling,
}

impl LifecycleStage {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "learning" => Some(Self::Learning),
            "scaling" => Some(Self::Scaling),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Learning => "learning",
            Self::Scaling => "scaling",
        }
    }
}

/// Subject filters attached to a run. `stage` and `target_environment` are
/// descriptive; only `workspace_id` and `segment` narrow the event feed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SimulationFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_environment: Option<String>,
}

impl SimulationFilters {
    pub fn lifecycle_stage(&self) -> Option<LifecycleStage> {
        self.stage.as_deref().and_then(LifecycleStage::parse)
    }
}
