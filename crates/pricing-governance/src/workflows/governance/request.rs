use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{ConfigVersionId, DecisionId, SimulationRunId, SubjectResolution, TargetEnvironment};
use crate::workflows::simulation::{LifecycleStage, SimulationSettingsRequest};

const DEFAULT_DECISION_LIMIT: usize = 50;
const MAX_DECISION_LIMIT: usize = 200;

/// Request to simulate a stored candidate config, optionally against a baseline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationRunRequest {
    #[serde(default)]
    pub candidate_config_version_id: Option<String>,
    /// `"none"` or empty means no baseline.
    #[serde(default)]
    pub baseline_config_version_id: Option<String>,
    #[serde(flatten)]
    pub settings: SimulationSettingsRequest,
}

impl SimulationRunRequest {
    pub fn candidate_id(&self) -> Option<ConfigVersionId> {
        non_empty(self.candidate_config_version_id.as_deref()).map(ConfigVersionId::from)
    }

    pub fn baseline_id(&self) -> Option<ConfigVersionId> {
        non_empty(self.baseline_config_version_id.as_deref())
            .filter(|id| *id != "none")
            .map(ConfigVersionId::from)
    }
}

/// Approval of a simulated candidate config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    #[serde(default)]
    pub config_version_id: Option<String>,
    #[serde(default)]
    pub simulation_run_id: Option<String>,
    #[serde(default)]
    pub approver_name: Option<String>,
    #[serde(default)]
    pub approver_role: Option<String>,
    #[serde(default)]
    pub rationale: Option<String>,
    #[serde(default)]
    pub effective_at: Option<DateTime<Utc>>,
}

/// Approval fields after presence checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedApproval {
    pub config_version_id: ConfigVersionId,
    pub simulation_run_id: SimulationRunId,
    pub approver_name: String,
    pub approver_role: String,
    pub rationale: String,
    pub effective_at: Option<DateTime<Utc>>,
}

impl ApprovalRequest {
    /// `None` when any required field is absent or blank.
    pub fn validate(&self) -> Option<ValidatedApproval> {
        Some(ValidatedApproval {
            config_version_id: non_empty(self.config_version_id.as_deref())?.into(),
            simulation_run_id: non_empty(self.simulation_run_id.as_deref())?.into(),
            approver_name: non_empty(self.approver_name.as_deref())?.to_string(),
            approver_role: non_empty(self.approver_role.as_deref())?.to_string(),
            rationale: non_empty(self.rationale.as_deref())?.to_string(),
            effective_at: self.effective_at,
        })
    }
}

/// Query string of the runtime config lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectQuery {
    #[serde(default)]
    pub workspace_id: Option<String>,
    #[serde(default)]
    pub segment: Option<String>,
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default)]
    pub target_environment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubjectQueryError {
    #[error("Missing required query parameters: workspace_id, segment, stage, target_environment")]
    Missing,
    #[error("Invalid stage. Must be: learning, scaling")]
    InvalidStage,
    #[error("Invalid target_environment. Must be: sandbox, production")]
    InvalidTargetEnvironment,
}

impl SubjectQuery {
    pub fn resolve(&self) -> Result<SubjectResolution, SubjectQueryError> {
        let (Some(workspace_id), Some(segment), Some(stage), Some(target_environment)) = (
            non_empty(self.workspace_id.as_deref()),
            non_empty(self.segment.as_deref()),
            non_empty(self.stage.as_deref()),
            non_empty(self.target_environment.as_deref()),
        ) else {
            return Err(SubjectQueryError::Missing);
        };

        Ok(SubjectResolution {
            workspace_id: workspace_id.to_string(),
            segment: segment.to_string(),
            stage: LifecycleStage::parse(stage).ok_or(SubjectQueryError::InvalidStage)?,
            target_environment: TargetEnvironment::parse(target_environment)
                .ok_or(SubjectQueryError::InvalidTargetEnvironment)?,
        })
    }
}

/// Filters for listing decision records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub workspace_id: Option<String>,
    #[serde(default)]
    pub segment: Option<String>,
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default)]
    pub target_environment: Option<String>,
    #[serde(default)]
    pub limit: Option<String>,
}

impl DecisionQuery {
    /// Requested page size clamped to `1..=200`. Absent or non-numeric
    /// values fall back to 50; a blank value counts as zero.
    pub fn limit(&self) -> usize {
        let Some(raw) = self.limit.as_deref().map(str::trim) else {
            return DEFAULT_DECISION_LIMIT;
        };
        let requested = if raw.is_empty() {
            0.0
        } else {
            raw.parse::<f64>().unwrap_or(f64::NAN)
        };
        if !requested.is_finite() {
            return DEFAULT_DECISION_LIMIT;
        }
        requested.clamp(1.0, MAX_DECISION_LIMIT as f64) as usize
    }

    pub fn search_term(&self) -> Option<&str> {
        non_empty(self.q.as_deref().map(str::trim))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareQuery {
    #[serde(default)]
    pub decision_id_a: Option<String>,
    #[serde(default)]
    pub decision_id_b: Option<String>,
}

impl CompareQuery {
    pub fn ids(&self) -> Option<(DecisionId, DecisionId)> {
        Some((
            non_empty(self.decision_id_a.as_deref())?.into(),
            non_empty(self.decision_id_b.as_deref())?.into(),
        ))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}
