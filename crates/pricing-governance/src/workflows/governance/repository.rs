use chrono::{DateTime, Utc};

use super::domain::{
    BillingPatchId, ConfigVersion, ConfigVersionId, CycleId, DecisionId, PricingCycle,
    SimulationRunId,
};
use super::records::{BillingPatch, DecisionRecord, SimulationRun};
use crate::workflows::simulation::ValueUnitDefinition;

/// Writes performed when a candidate config is approved. Implementations
/// apply them all or none.
#[derive(Debug, Clone, PartialEq)]
pub struct Activation {
    pub archive: Option<ConfigVersionId>,
    pub activate: ConfigVersionId,
    pub effective_at: DateTime<Utc>,
    pub billing_patch: BillingPatch,
    pub decision: DecisionRecord,
}

/// Storage abstraction so the governance service can be exercised in isolation.
pub trait GovernanceRepository: Send + Sync {
    fn cycle(&self, id: &CycleId) -> Result<Option<PricingCycle>, RepositoryError>;
    /// Value-unit definitions owned by a cycle.
    fn value_units(&self, cycle_id: &CycleId) -> Result<Vec<ValueUnitDefinition>, RepositoryError>;
    fn config(&self, id: &ConfigVersionId) -> Result<Option<ConfigVersion>, RepositoryError>;
    fn configs(&self) -> Result<Vec<ConfigVersion>, RepositoryError>;
    /// Customers in a segment; `None` counts every customer.
    fn customer_count(&self, segment: Option<&str>) -> Result<u64, RepositoryError>;
    fn insert_simulation_run(&self, run: SimulationRun) -> Result<(), RepositoryError>;
    fn simulation_run(&self, id: &SimulationRunId) -> Result<Option<SimulationRun>, RepositoryError>;
    fn commit_activation(&self, activation: Activation) -> Result<(), RepositoryError>;
    fn decision(&self, id: &DecisionId) -> Result<Option<DecisionRecord>, RepositoryError>;
    fn decisions(&self) -> Result<Vec<DecisionRecord>, RepositoryError>;
    fn billing_patch(&self, id: &BillingPatchId) -> Result<Option<BillingPatch>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
