//! Approval workflow around the simulation engine: recorded simulation runs,
//! production activation gating, billing patches, decision records and the
//! runtime lookup of the active config for a subject.

pub mod domain;
pub mod gate;
pub mod records;
pub mod repository;
pub mod request;
pub mod router;
pub mod service;
pub mod views;

#[cfg(test)]
mod tests;

pub use domain::{
    BillingPatchId, ConfigStatus, ConfigVersion, ConfigVersionId, CycleId, CycleType, DecisionId,
    PricingCycle, SimulationRunId, SubjectResolution, TargetEnvironment,
};
pub use gate::{check_production_activation, ActivationGateError};
pub use records::{
    ApprovalOutcome, BillingPatch, BillingPatchPayload, ConfigDiff, DecisionRecord, SimulationRun,
    SimulationRunInput, SimulationRunView,
};
pub use repository::{Activation, GovernanceRepository, RepositoryError};
pub use request::{
    ApprovalRequest, CompareQuery, DecisionQuery, SimulationRunRequest, SubjectQuery,
    SubjectQueryError,
};
pub use router::{governance_router, PreviewRequest};
pub use service::{GovernanceError, GovernanceService};
pub use views::{
    BaselineOption, DecisionBundle, DecisionComparison, DecisionSummary, RuntimeConfig,
};
