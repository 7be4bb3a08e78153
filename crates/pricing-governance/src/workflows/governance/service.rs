use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::domain::{
    BillingPatchId, ConfigStatus, ConfigVersion, ConfigVersionId, CycleId, DecisionId,
    SimulationRunId, SubjectResolution, TargetEnvironment,
};
use super::gate::{check_production_activation, ActivationGateError};
use super::records::{
    ApprovalOutcome, BillingPatch, ConfigDiff, DecisionRecord, SimulationRun, SimulationRunInput,
};
use super::repository::{Activation, GovernanceRepository, RepositoryError};
use super::request::{ApprovalRequest, DecisionQuery, SimulationRunRequest, SubjectQueryError};
use super::views::{
    BaselineOption, DecisionBundle, DecisionComparison, DecisionSummary, NorthStar,
    RuntimeConfig, RuntimeGovernance, METRIC_LENSES,
};
use crate::workflows::simulation::{
    PricingScenario, SimulationEngine, SimulationRequestError, UsageFeed,
};

static SIMULATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static DECISION_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static BILLING_PATCH_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_simulation_run_id() -> SimulationRunId {
    let id = SIMULATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    SimulationRunId(format!("sim_{id:06}"))
}

fn next_decision_id() -> DecisionId {
    let id = DECISION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    DecisionId(format!("dec_{id:06}"))
}

fn next_billing_patch_id() -> BillingPatchId {
    let id = BILLING_PATCH_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    BillingPatchId(format!("bp_{id:06}"))
}

/// Service composing the simulation engine, the usage feed and storage
/// into the simulate / approve / activate workflow.
pub struct GovernanceService<R> {
    repository: Arc<R>,
    feed: Arc<UsageFeed>,
}

impl<R> GovernanceService<R>
where
    R: GovernanceRepository + 'static,
{
    pub fn new(repository: Arc<R>, feed: Arc<UsageFeed>) -> Self {
        Self { repository, feed }
    }

    pub fn feed(&self) -> &UsageFeed {
        &self.feed
    }

    /// Simulate a stored candidate config against the loaded feed and record the run.
    pub fn simulate(&self, request: SimulationRunRequest) -> Result<SimulationRun, GovernanceError> {
        let candidate_id = request.candidate_id().ok_or(GovernanceError::Request(
            SimulationRequestError::MissingField("candidate_config_version_id"),
        ))?;
        let baseline_id = request.baseline_id();

        let mut lookup_error = None;
        let params = request.settings.validate(|segment| {
            self.repository
                .customer_count(segment)
                .unwrap_or_else(|err| {
                    lookup_error = Some(err);
                    0
                })
        })?;
        if let Some(err) = lookup_error {
            return Err(err.into());
        }

        let candidate = self
            .repository
            .config(&candidate_id)?
            .ok_or(GovernanceError::CandidateNotFound(candidate_id))?;

        let baseline = match baseline_id {
            Some(id) => {
                let found = self.repository.config(&id)?;
                if found.is_none() {
                    warn!(baseline_config_version_id = %id, "baseline config not found, simulating without it");
                }
                found
            }
            None => None,
        };

        let candidate_units = self.repository.value_units(&candidate.cycle_id)?;
        let baseline_units = match &baseline {
            Some(config) if config.cycle_id != candidate.cycle_id => {
                Some(self.repository.value_units(&config.cycle_id)?)
            }
            _ => None,
        };

        let engine = SimulationEngine::new(params);
        let output = engine.run(
            PricingScenario::new(&candidate.snapshot, &candidate_units),
            baseline.as_ref().map(|config| {
                PricingScenario::new(
                    &config.snapshot,
                    baseline_units.as_deref().unwrap_or(&candidate_units),
                )
            }),
            self.feed.events(),
        );
        let completeness_result = output.completeness();

        let run = SimulationRun {
            simulation_run_id: next_simulation_run_id(),
            config_version_id: candidate.config_version_id.clone(),
            baseline_config_version_id: baseline.map(|config| config.config_version_id),
            input: SimulationRunInput::record(engine.params(), &output),
            output,
            completeness_result,
            created_at: Utc::now(),
        };
        self.repository.insert_simulation_run(run.clone())?;

        info!(
            simulation_run_id = %run.simulation_run_id,
            config_version_id = %run.config_version_id,
            completeness = run.completeness_result.label(),
            "simulation run recorded"
        );
        Ok(run)
    }

    /// Approve a simulated candidate: archive the prior active config for the
    /// subject, write the billing patch and decision record, activate the candidate.
    pub fn approve(&self, request: &ApprovalRequest) -> Result<ApprovalOutcome, GovernanceError> {
        let approval = request
            .validate()
            .ok_or(GovernanceError::MissingApprovalFields)?;
        let now = Utc::now();
        let effective_at = approval.effective_at.unwrap_or(now);

        let candidate = self
            .repository
            .config(&approval.config_version_id)?
            .ok_or_else(|| GovernanceError::ConfigNotFound(approval.config_version_id.clone()))?;
        let run = self
            .repository
            .simulation_run(&approval.simulation_run_id)?
            .ok_or_else(|| {
                GovernanceError::SimulationRunNotFound(approval.simulation_run_id.clone())
            })?;
        if run.config_version_id != candidate.config_version_id {
            return Err(GovernanceError::RunConfigMismatch);
        }

        let baseline = self.active_baseline(&candidate)?;

        if candidate.subject.target_environment == TargetEnvironment::Production {
            let cycle = self
                .repository
                .cycle(&candidate.cycle_id)?
                .ok_or_else(|| GovernanceError::CycleNotFound(candidate.cycle_id.clone()))?;
            if let Err(err) = check_production_activation(&cycle, &candidate.snapshot.rails) {
                warn!(
                    config_version_id = %candidate.config_version_id,
                    %err,
                    "production activation rejected"
                );
                return Err(err.into());
            }
        }

        let diff = ConfigDiff::between(baseline.as_ref(), &candidate);
        let pools_changed = diff.pools_changed();
        let billing_patch =
            BillingPatch::for_config(next_billing_patch_id(), &candidate, effective_at, now);
        let decision = DecisionRecord {
            decision_id: next_decision_id(),
            config_version_id: candidate.config_version_id.clone(),
            cycle_id: candidate.cycle_id.clone(),
            baseline_config_version_id: baseline
                .as_ref()
                .map(|config| config.config_version_id.clone()),
            billing_patch_id: billing_patch.billing_patch_id.clone(),
            subject_resolution: candidate.subject.clone(),
            value_unit_snapshot_version: candidate.value_unit_snapshot_version,
            approver_name: approval.approver_name,
            approver_role: approval.approver_role,
            rationale: approval.rationale,
            diff,
            simulation_run_id: run.simulation_run_id,
            effective_at,
            created_at: now,
        };

        let outcome = ApprovalOutcome {
            decision_id: decision.decision_id.clone(),
            config_version_id: candidate.config_version_id.clone(),
            billing_patch_id: billing_patch.billing_patch_id.clone(),
            status: ConfigStatus::Active,
        };

        self.repository.commit_activation(Activation {
            archive: baseline.map(|config| config.config_version_id),
            activate: candidate.config_version_id,
            effective_at,
            billing_patch,
            decision,
        })?;

        info!(
            decision_id = %outcome.decision_id,
            config_version_id = %outcome.config_version_id,
            pools_changed,
            "config activated"
        );
        Ok(outcome)
    }

    /// Newest active config serving a subject, shaped for runtime metering.
    pub fn active_config(&self, subject: &SubjectResolution) -> Result<RuntimeConfig, GovernanceError> {
        let config = self
            .repository
            .configs()?
            .into_iter()
            .filter(|config| config.is_active() && config.subject == *subject)
            .max_by_key(|config| (config.effective_at, config.created_at))
            .ok_or_else(|| GovernanceError::NoActiveConfig(subject.clone()))?;

        let cycle = self
            .repository
            .cycle(&config.cycle_id)?
            .ok_or_else(|| GovernanceError::CycleNotFound(config.cycle_id.clone()))?;

        let pooled: BTreeSet<_> = config.pooled_value_unit_ids().into_iter().collect();
        let mut value_units: Vec<_> = self
            .repository
            .value_units(&config.cycle_id)?
            .into_iter()
            .filter(|unit| pooled.contains(&unit.value_unit_id))
            .collect();
        value_units.sort_by(|left, right| left.value_unit_id.cmp(&right.value_unit_id));

        let approval = self
            .repository
            .decisions()?
            .into_iter()
            .filter(|decision| decision.config_version_id == config.config_version_id)
            .max_by_key(|decision| decision.created_at);

        Ok(RuntimeConfig {
            cycle_id: config.cycle_id.clone(),
            config_version_id: config.config_version_id.clone(),
            effective_at: config.effective_at,
            north_star: NorthStar::from(&cycle),
            subject_resolution: config.subject.clone(),
            value_units,
            snapshot: config.snapshot.clone(),
            price_book_ref: config.price_book_ref.clone(),
            metric_lenses: METRIC_LENSES,
            governance: RuntimeGovernance::new(&config, approval.as_ref()),
            generated_at: Utc::now(),
        })
    }

    pub fn config(&self, id: &ConfigVersionId) -> Result<ConfigVersion, GovernanceError> {
        self.repository
            .config(id)?
            .ok_or_else(|| GovernanceError::ConfigNotFound(id.clone()))
    }

    /// Every config version, newest first.
    pub fn configs(&self) -> Result<Vec<ConfigVersion>, GovernanceError> {
        let mut configs = self.repository.configs()?;
        configs.sort_by_key(|config| Reverse(config.created_at));
        Ok(configs)
    }

    /// Other configs of the same subject, highest version first.
    pub fn baseline_options(
        &self,
        id: &ConfigVersionId,
    ) -> Result<Vec<BaselineOption>, GovernanceError> {
        let config = self.config(id)?;
        let mut options: Vec<BaselineOption> = self
            .repository
            .configs()?
            .iter()
            .filter(|other| other.subject == config.subject && other.config_version_id != *id)
            .map(BaselineOption::from)
            .collect();
        options.sort_by_key(|option| Reverse(option.version));
        Ok(options)
    }

    pub fn decision(&self, id: &DecisionId) -> Result<DecisionBundle, GovernanceError> {
        self.load_decision(id)?
            .ok_or_else(|| GovernanceError::DecisionNotFound(id.clone()))
    }

    pub fn compare_decisions(
        &self,
        a: &DecisionId,
        b: &DecisionId,
    ) -> Result<DecisionComparison, GovernanceError> {
        match (self.load_decision(a)?, self.load_decision(b)?) {
            (Some(a), Some(b)) => Ok(DecisionComparison { a, b }),
            _ => Err(GovernanceError::ComparisonNotFound),
        }
    }

    /// Decision log filtered by subject fields and a free-text term, newest first.
    pub fn decisions(&self, query: &DecisionQuery) -> Result<Vec<DecisionSummary>, GovernanceError> {
        let configs: HashMap<ConfigVersionId, ConfigVersion> = self
            .repository
            .configs()?
            .into_iter()
            .map(|config| (config.config_version_id.clone(), config))
            .collect();

        let subject_filtered = [
            &query.workspace_id,
            &query.segment,
            &query.stage,
            &query.target_environment,
        ]
        .iter()
        .any(|filter| filter.is_some());
        let matches_subject = |config_id: &ConfigVersionId| {
            if !subject_filtered {
                return true;
            }
            configs
                .get(config_id)
                .map(|config| subject_matches(&config.subject, query))
                .unwrap_or(false)
        };

        let mut decisions: Vec<DecisionRecord> = self
            .repository
            .decisions()?
            .into_iter()
            .filter(|decision| matches_subject(&decision.config_version_id))
            .filter(|decision| match query.search_term() {
                Some(term) => decision.mentions(term),
                None => true,
            })
            .collect();
        decisions.sort_by_key(|decision| Reverse(decision.created_at));

        Ok(decisions
            .iter()
            .take(query.limit())
            .map(|decision| DecisionSummary::new(decision, configs.get(&decision.config_version_id)))
            .collect())
    }

    fn active_baseline(
        &self,
        candidate: &ConfigVersion,
    ) -> Result<Option<ConfigVersion>, GovernanceError> {
        Ok(self
            .repository
            .configs()?
            .into_iter()
            .filter(|config| {
                config.is_active()
                    && config.subject == candidate.subject
                    && config.config_version_id != candidate.config_version_id
            })
            .max_by_key(|config| config.created_at))
    }

    fn load_decision(&self, id: &DecisionId) -> Result<Option<DecisionBundle>, GovernanceError> {
        let Some(decision) = self.repository.decision(id)? else {
            return Ok(None);
        };

        Ok(Some(DecisionBundle {
            config: self.repository.config(&decision.config_version_id)?,
            simulation: self.repository.simulation_run(&decision.simulation_run_id)?,
            billing_patch: self.repository.billing_patch(&decision.billing_patch_id)?,
            decision,
        }))
    }
}

fn subject_matches(subject: &SubjectResolution, query: &DecisionQuery) -> bool {
    let field_matches = |filter: &Option<String>, value: &str| {
        filter
            .as_deref()
            .map(|expected| expected == value)
            .unwrap_or(true)
    };

    field_matches(&query.workspace_id, &subject.workspace_id)
        && field_matches(&query.segment, &subject.segment)
        && field_matches(&query.stage, subject.stage.as_str())
        && field_matches(&query.target_environment, subject.target_environment.as_str())
}

/// Error raised by the governance service.
#[derive(Debug, thiserror::Error)]
pub enum GovernanceError {
    #[error(transparent)]
    Request(#[from] SimulationRequestError),
    #[error(
        "Missing required fields: config_version_id, simulation_run_id, approver_name, approver_role, rationale"
    )]
    MissingApprovalFields,
    #[error(transparent)]
    Subject(#[from] SubjectQueryError),
    #[error("Candidate config not found: {0}")]
    CandidateNotFound(ConfigVersionId),
    #[error("Config not found: {0}")]
    ConfigNotFound(ConfigVersionId),
    #[error("SimulationRun not found: {0}")]
    SimulationRunNotFound(SimulationRunId),
    #[error("SimulationRun does not belong to this config_version_id")]
    RunConfigMismatch,
    #[error("pricing cycle {0} referenced by a config is missing")]
    CycleNotFound(CycleId),
    #[error(transparent)]
    Gate(#[from] ActivationGateError),
    #[error("No active config found for the given subject_resolution")]
    NoActiveConfig(SubjectResolution),
    #[error("DecisionRecord not found: {0}")]
    DecisionNotFound(DecisionId),
    #[error("One or both DecisionRecords not found")]
    ComparisonNotFound,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
