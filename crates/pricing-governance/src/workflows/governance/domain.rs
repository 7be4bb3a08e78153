use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::simulation::{ConfigurationSnapshot, LifecycleStage, ValueUnitId};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

string_id!(
    /// Pricing cycle that owns value-unit definitions and config versions.
    CycleId
);
string_id!(ConfigVersionId);
string_id!(SimulationRunId);
string_id!(DecisionId);
string_id!(BillingPatchId);

/// Sandbox cycles are for experimentation; production cycles gate activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleType {
    Sandbox,
    Production,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetEnvironment {
    Sandbox,
    Production,
}

impl TargetEnvironment {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "sandbox" => Some(Self::Sandbox),
            "production" => Some(Self::Production),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sandbox => "sandbox",
            Self::Production => "production",
        }
    }
}

/// Lifecycle of a configuration version. Only one version per subject is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigStatus {
    Draft,
    Candidate,
    Active,
    Archived,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingCycle {
    pub cycle_id: CycleId,
    pub workspace_id: String,
    pub cycle_type: CycleType,
    pub period_length_days: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_type: Option<String>,
    #[serde(default)]
    pub primary_metrics: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
}

/// Workspace, segment, stage and environment a configuration applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectResolution {
    pub workspace_id: String,
    pub segment: String,
    pub stage: LifecycleStage,
    pub target_environment: TargetEnvironment,
}

/// One versioned pricing configuration for a subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigVersion {
    pub config_version_id: ConfigVersionId,
    pub cycle_id: CycleId,
    #[serde(flatten)]
    pub subject: SubjectResolution,
    pub version: u32,
    pub status: ConfigStatus,
    pub price_book_ref: String,
    pub value_unit_snapshot_version: u32,
    #[serde(flatten)]
    pub snapshot: ConfigurationSnapshot,
    #[serde(default)]
    pub effective_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub billing_patch_id: Option<BillingPatchId>,
    pub created_at: DateTime<Utc>,
}

impl ConfigVersion {
    pub fn is_active(&self) -> bool {
        self.status == ConfigStatus::Active
    }

    /// Distinct value units referenced by the pools, in id order.
    pub fn pooled_value_unit_ids(&self) -> Vec<ValueUnitId> {
        let mut ids: Vec<ValueUnitId> = self
            .snapshot
            .pools
            .iter()
            .map(|pool| pool.value_unit_id.clone())
            .filter(|id| !id.0.is_empty())
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }
}
