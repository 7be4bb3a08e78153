use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{
    ConfigStatus, ConfigVersion, ConfigVersionId, CycleId, DecisionId, PricingCycle,
    SimulationRunId, SubjectResolution,
};
use super::records::{BillingPatch, DecisionRecord, SimulationRun};
use crate::workflows::simulation::{ConfigurationSnapshot, ValueUnitDefinition};

/// Lenses every runtime consumer reports against.
pub const METRIC_LENSES: [&str; 2] = ["exploration_depth", "margin_floor_violations"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NorthStar {
    pub goal_type: Option<String>,
    pub primary_metrics: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
}

impl From<&PricingCycle> for NorthStar {
    fn from(cycle: &PricingCycle) -> Self {
        Self {
            goal_type: cycle.goal_type.clone(),
            primary_metrics: cycle.primary_metrics.clone(),
            narrative: cycle.narrative.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditEntry {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub by: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuntimeGovernance {
    pub config_version_id: ConfigVersionId,
    pub approval_ref: Option<DecisionId>,
    pub config_status: ConfigStatus,
    pub audit: Vec<AuditEntry>,
}

impl RuntimeGovernance {
    pub fn new(config: &ConfigVersion, approval: Option<&DecisionRecord>) -> Self {
        Self {
            config_version_id: config.config_version_id.clone(),
            approval_ref: approval.map(|decision| decision.decision_id.clone()),
            config_status: config.status,
            audit: approval
                .map(|decision| AuditEntry {
                    kind: "approved",
                    by: decision.approved_by(),
                    at: decision.created_at,
                })
                .into_iter()
                .collect(),
        }
    }
}

/// Active configuration served to runtime metering for one subject.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuntimeConfig {
    pub cycle_id: CycleId,
    pub config_version_id: ConfigVersionId,
    pub effective_at: Option<DateTime<Utc>>,
    pub north_star: NorthStar,
    pub subject_resolution: SubjectResolution,
    /// Only the value units referenced by a pool, in id order.
    pub value_units: Vec<ValueUnitDefinition>,
    #[serde(flatten)]
    pub snapshot: ConfigurationSnapshot,
    pub price_book_ref: String,
    pub metric_lenses: [&'static str; 2],
    pub governance: RuntimeGovernance,
    pub generated_at: DateTime<Utc>,
}

/// A decision with everything it points at.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionBundle {
    pub decision: DecisionRecord,
    pub config: Option<ConfigVersion>,
    pub simulation: Option<SimulationRun>,
    pub billing_patch: Option<BillingPatch>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionComparison {
    pub a: DecisionBundle,
    pub b: DecisionBundle,
}

/// Row of the decision log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionSummary {
    pub decision_id: DecisionId,
    pub created_at: DateTime<Utc>,
    pub effective_at: DateTime<Utc>,
    pub approver_name: String,
    pub approver_role: String,
    pub rationale: String,
    pub config_version_id: ConfigVersionId,
    pub baseline_config_version_id: Option<ConfigVersionId>,
    pub simulation_run_id: SimulationRunId,
    pub subject_resolution: SubjectResolution,
    pub config_status: Option<ConfigStatus>,
    pub config_version_number: Option<u32>,
}

impl DecisionSummary {
    pub fn new(decision: &DecisionRecord, config: Option<&ConfigVersion>) -> Self {
        Self {
            decision_id: decision.decision_id.clone(),
            created_at: decision.created_at,
            effective_at: decision.effective_at,
            approver_name: decision.approver_name.clone(),
            approver_role: decision.approver_role.clone(),
            rationale: decision.rationale.clone(),
            config_version_id: decision.config_version_id.clone(),
            baseline_config_version_id: decision.baseline_config_version_id.clone(),
            simulation_run_id: decision.simulation_run_id.clone(),
            subject_resolution: decision.subject_resolution.clone(),
            config_status: config.map(|config| config.status),
            config_version_number: config.map(|config| config.version),
        }
    }
}

/// Another config of the same subject that can serve as a simulation baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaselineOption {
    pub config_version_id: ConfigVersionId,
    pub version: u32,
    pub status: ConfigStatus,
    pub effective_at: Option<DateTime<Utc>>,
}

impl From<&ConfigVersion> for BaselineOption {
    fn from(config: &ConfigVersion) -> Self {
        Self {
            config_version_id: config.config_version_id.clone(),
            version: config.version,
            status: config.status,
            effective_at: config.effective_at,
        }
    }
}
