use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    BillingPatchId, ConfigStatus, ConfigVersion, ConfigVersionId, CycleId, DecisionId,
    SimulationRunId, SubjectResolution,
};
use crate::workflows::simulation::{
    CommitSemantics, CompletenessResult, ConfigurationSnapshot, PoolId, PricingMode,
    SimulationFilters, SimulationOutput, SimulationParameters,
};

/// Note stamped on every generated billing patch.
pub const BILLING_PATCH_NOTE: &str = "Patch recorded locally; no billing provider API was called";

/// Inputs of a persisted run, with the churn values the engine resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRunInput {
    pub historical_window_days: f64,
    pub filters: SimulationFilters,
    pub pricing_mode: PricingMode,
    pub include_exploration_in_results: bool,
    pub segment_customer_count: u64,
    #[serde(default)]
    pub annual_churn_rate: Option<f64>,
    #[serde(default)]
    pub monthly_churn_rate: Option<f64>,
    pub churn_horizon_months: u32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub pool_pricing_mode_overrides: BTreeMap<PoolId, PricingMode>,
    pub commit_semantics: CommitSemantics,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub pool_commit_semantics_overrides: BTreeMap<PoolId, CommitSemantics>,
}

impl SimulationRunInput {
    pub fn record(params: &SimulationParameters, output: &SimulationOutput) -> Self {
        let assumptions = output.economics_summary.assumptions.as_ref();

        Self {
            historical_window_days: params.historical_window_days,
            filters: params.filters.clone(),
            pricing_mode: params.pricing_mode,
            include_exploration_in_results: params.include_exploration_in_results,
            segment_customer_count: params.segment_customer_count,
            annual_churn_rate: assumptions.map(|a| a.annual_churn_rate),
            monthly_churn_rate: assumptions.map(|a| a.monthly_churn_rate),
            churn_horizon_months: assumptions
                .map(|a| a.churn_horizon_months)
                .unwrap_or(params.churn_horizon_months),
            pool_pricing_mode_overrides: params.pool_pricing_mode_overrides.clone(),
            commit_semantics: params.commit_semantics,
            pool_commit_semantics_overrides: params.pool_commit_semantics_overrides.clone(),
        }
    }
}

/// Immutable record of one simulation of a candidate config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRun {
    pub simulation_run_id: SimulationRunId,
    pub config_version_id: ConfigVersionId,
    pub baseline_config_version_id: Option<ConfigVersionId>,
    pub input: SimulationRunInput,
    pub output: SimulationOutput,
    pub completeness_result: CompletenessResult,
    pub created_at: DateTime<Utc>,
}

impl SimulationRun {
    pub fn view(&self) -> SimulationRunView<'_> {
        SimulationRunView {
            simulation_run_id: &self.simulation_run_id,
            candidate_config_version_id: &self.config_version_id,
            baseline_config_version_id: self.baseline_config_version_id.as_ref(),
            output: &self.output,
            completeness_result: self.completeness_result,
        }
    }
}

/// Response body for a freshly recorded simulation run.
#[derive(Debug, Serialize)]
pub struct SimulationRunView<'a> {
    pub simulation_run_id: &'a SimulationRunId,
    pub candidate_config_version_id: &'a ConfigVersionId,
    pub baseline_config_version_id: Option<&'a ConfigVersionId>,
    pub output: &'a SimulationOutput,
    pub completeness_result: CompletenessResult,
}

/// Before/after snapshot of the fields an approval changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigDiff {
    pub baseline_config_version_id: Option<ConfigVersionId>,
    pub candidate_config_version_id: ConfigVersionId,
    pub before: Option<ConfigurationSnapshot>,
    pub after: ConfigurationSnapshot,
}

impl ConfigDiff {
    pub fn between(baseline: Option<&ConfigVersion>, candidate: &ConfigVersion) -> Self {
        Self {
            baseline_config_version_id: baseline.map(|config| config.config_version_id.clone()),
            candidate_config_version_id: candidate.config_version_id.clone(),
            before: baseline.map(|config| config.snapshot.clone()),
            after: candidate.snapshot.clone(),
        }
    }

    pub fn pools_changed(&self) -> bool {
        self.before
            .as_ref()
            .map(|before| before.pools != self.after.pools)
            .unwrap_or(true)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingPatchPayload {
    pub billing_patch_id: BillingPatchId,
    pub generated_at: DateTime<Utc>,
    pub config_version_id: ConfigVersionId,
    pub price_book_ref: String,
    pub note: String,
}

/// Billing-side change generated when a config is activated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingPatch {
    pub billing_patch_id: BillingPatchId,
    pub config_version_id: ConfigVersionId,
    pub workspace_id: String,
    pub cycle_id: CycleId,
    pub price_book_ref: String,
    pub effective_at: DateTime<Utc>,
    pub payload: BillingPatchPayload,
    pub created_at: DateTime<Utc>,
}

impl BillingPatch {
    pub fn for_config(
        billing_patch_id: BillingPatchId,
        config: &ConfigVersion,
        effective_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            payload: BillingPatchPayload {
                billing_patch_id: billing_patch_id.clone(),
                generated_at: now,
                config_version_id: config.config_version_id.clone(),
                price_book_ref: config.price_book_ref.clone(),
                note: BILLING_PATCH_NOTE.to_string(),
            },
            billing_patch_id,
            config_version_id: config.config_version_id.clone(),
            workspace_id: config.subject.workspace_id.clone(),
            cycle_id: config.cycle_id.clone(),
            price_book_ref: config.price_book_ref.clone(),
            effective_at,
            created_at: now,
        }
    }
}

/// Audit record of an approval that activated a config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub decision_id: DecisionId,
    pub config_version_id: ConfigVersionId,
    pub cycle_id: CycleId,
    pub baseline_config_version_id: Option<ConfigVersionId>,
    pub billing_patch_id: BillingPatchId,
    pub subject_resolution: SubjectResolution,
    pub value_unit_snapshot_version: u32,
    pub approver_name: String,
    pub approver_role: String,
    pub rationale: String,
    pub diff: ConfigDiff,
    pub simulation_run_id: SimulationRunId,
    pub effective_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl DecisionRecord {
    pub fn approved_by(&self) -> String {
        format!("{}, {}", self.approver_name, self.approver_role)
    }

    /// Case-sensitive substring match over ids, approver and rationale.
    pub fn mentions(&self, needle: &str) -> bool {
        let baseline = self
            .baseline_config_version_id
            .as_ref()
            .map(|id| id.0.as_str())
            .unwrap_or_default();

        [
            self.decision_id.0.as_str(),
            self.config_version_id.0.as_str(),
            baseline,
            self.approver_name.as_str(),
            self.approver_role.as_str(),
            self.rationale.as_str(),
        ]
        .iter()
        .any(|field| field.contains(needle))
    }
}

/// Response body for a successful approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalOutcome {
    pub decision_id: DecisionId,
    pub config_version_id: ConfigVersionId,
    pub billing_patch_id: BillingPatchId,
    pub status: ConfigStatus,
}
