use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::governance::domain::{
    BillingPatchId, ConfigStatus, ConfigVersion, ConfigVersionId, CycleId, CycleType, DecisionId,
    PricingCycle, SimulationRunId, SubjectResolution, TargetEnvironment,
};
use crate::workflows::governance::records::{BillingPatch, DecisionRecord, SimulationRun};
use crate::workflows::governance::repository::{
    Activation, GovernanceRepository, RepositoryError,
};
use crate::workflows::governance::{ApprovalRequest, GovernanceService, SimulationRunRequest};
use crate::workflows::simulation::{
    ConfigurationSnapshot, EventMapping, ExplorationConfig, LifecycleStage, PoolId, Rails,
    SimulationFilters, SimulationSettingsRequest, UnitEconomics, UsageEvent, UsageFeed, UsagePool,
    UsageThreshold, ValueUnitDefinition, ValueUnitId,
};

pub(super) const CYCLE: &str = "cyc_smb_prod_q1";
pub(super) const ACTIVE: &str = "cfg_smb_learning_prod_v1";
pub(super) const CANDIDATE: &str = "cfg_smb_learning_prod_v2";
pub(super) const RENDER_UNIT: &str = "vu_render_minutes";

pub(super) fn at(month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, month, day, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn subject() -> SubjectResolution {
    SubjectResolution {
        workspace_id: "ws_1049".to_string(),
        segment: "ai_video_smb".to_string(),
        stage: LifecycleStage::Learning,
        target_environment: TargetEnvironment::Production,
    }
}

pub(super) fn production_cycle() -> PricingCycle {
    PricingCycle {
        cycle_id: CycleId::from(CYCLE),
        workspace_id: "ws_1049".to_string(),
        cycle_type: CycleType::Production,
        period_length_days: 90,
        goal_type: Some("activation".to_string()),
        primary_metrics: vec!["renders_per_workspace".to_string()],
        narrative: None,
    }
}

pub(super) fn render_unit() -> ValueUnitDefinition {
    ValueUnitDefinition {
        value_unit_id: ValueUnitId(RENDER_UNIT.to_string()),
        name: Some("Render minutes".to_string()),
        unit_type: Some("minutes".to_string()),
        event_mapping: EventMapping::count("render_completed"),
        unit_economics: Some(UnitEconomics::new(1.0, 2.0)),
    }
}

pub(super) fn unpooled_unit() -> ValueUnitDefinition {
    ValueUnitDefinition {
        value_unit_id: ValueUnitId("vu_storage_gb".to_string()),
        name: None,
        unit_type: None,
        event_mapping: EventMapping::sum("asset_stored", "gigabytes"),
        unit_economics: Some(UnitEconomics::new(0.02, 0.05)),
    }
}

pub(super) fn production_rails() -> Rails {
    Rails {
        margin_floor: Some(0.3),
        monthly_spend_cap_usd: Some(10_000.0),
        usage_thresholds: [70, 90, 100]
            .into_iter()
            .map(|percent| UsageThreshold {
                percent,
                action: Some("notify".to_string()),
            })
            .collect(),
    }
}

pub(super) fn config(
    id: &str,
    version: u32,
    status: ConfigStatus,
    included_quantity: f64,
    created_at: DateTime<Utc>,
) -> ConfigVersion {
    ConfigVersion {
        config_version_id: ConfigVersionId::from(id),
        cycle_id: CycleId::from(CYCLE),
        subject: subject(),
        version,
        status,
        price_book_ref: "usd_2026_01_default".to_string(),
        value_unit_snapshot_version: 1,
        snapshot: ConfigurationSnapshot {
            pools: vec![UsagePool {
                pool_id: PoolId("pool_render".to_string()),
                value_unit_id: ValueUnitId(RENDER_UNIT.to_string()),
                included_quantity,
            }],
            exploration: ExplorationConfig::default(),
            rails: production_rails(),
        },
        effective_at: (status == ConfigStatus::Active).then_some(created_at),
        billing_patch_id: None,
        created_at,
    }
}

pub(super) fn feed() -> Arc<UsageFeed> {
    let events = (0..150)
        .map(|_| {
            UsageEvent::of_type("render_completed")
                .with("workspace_id", "ws_1049")
                .with("segment", "ai_video_smb")
        })
        .collect();
    Arc::new(UsageFeed::new(events))
}

pub(super) fn seeded_repository() -> Arc<MemoryRepository> {
    let repository = MemoryRepository::default();
    {
        let mut state = repository.state.lock().expect("repository mutex poisoned");
        state.cycles.insert(CycleId::from(CYCLE), production_cycle());
        state
            .value_units
            .insert(CycleId::from(CYCLE), vec![unpooled_unit(), render_unit()]);
        for config in [
            config(ACTIVE, 1, ConfigStatus::Active, 50.0, at(1, 1)),
            config(CANDIDATE, 2, ConfigStatus::Candidate, 100.0, at(2, 1)),
        ] {
            state
                .configs
                .insert(config.config_version_id.clone(), config);
        }
        state.customers = vec![
            "ai_video_smb".to_string(),
            "ai_video_smb".to_string(),
            "enterprise".to_string(),
        ];
    }
    Arc::new(repository)
}

pub(super) fn build_service() -> (GovernanceService<MemoryRepository>, Arc<MemoryRepository>) {
    let repository = seeded_repository();
    let service = GovernanceService::new(repository.clone(), feed());
    (service, repository)
}

pub(super) fn simulation_request(candidate: &str, baseline: Option<&str>) -> SimulationRunRequest {
    SimulationRunRequest {
        candidate_config_version_id: Some(candidate.to_string()),
        baseline_config_version_id: baseline.map(str::to_string),
        settings: SimulationSettingsRequest {
            historical_window_days: Some(30.0),
            filters: Some(SimulationFilters {
                workspace_id: Some("ws_1049".to_string()),
                segment: Some("ai_video_smb".to_string()),
                stage: Some("learning".to_string()),
                target_environment: Some("production".to_string()),
            }),
            pricing_mode: Some("revenue_proxy_commit".to_string()),
            ..SimulationSettingsRequest::default()
        },
    }
}

pub(super) fn approval_request(config_id: &str, run_id: &SimulationRunId) -> ApprovalRequest {
    ApprovalRequest {
        config_version_id: Some(config_id.to_string()),
        simulation_run_id: Some(run_id.0.clone()),
        approver_name: Some("Dana Ruiz".to_string()),
        approver_role: Some("Head of Pricing".to_string()),
        rationale: Some("Commit floor restores margin above the rail".to_string()),
        effective_at: None,
    }
}

pub(super) async fn json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .expect("body readable");
    serde_json::from_slice(&body).expect("json body")
}

#[derive(Default)]
pub(super) struct MemoryState {
    pub(super) cycles: HashMap<CycleId, PricingCycle>,
    pub(super) value_units: HashMap<CycleId, Vec<ValueUnitDefinition>>,
    pub(super) configs: HashMap<ConfigVersionId, ConfigVersion>,
    pub(super) customers: Vec<String>,
    pub(super) runs: HashMap<SimulationRunId, SimulationRun>,
    pub(super) decisions: HashMap<DecisionId, DecisionRecord>,
    pub(super) patches: HashMap<BillingPatchId, BillingPatch>,
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) state: Arc<Mutex<MemoryState>>,
}

impl MemoryRepository {
    pub(super) fn status_of(&self, id: &str) -> Option<ConfigStatus> {
        let state = self.state.lock().expect("repository mutex poisoned");
        state
            .configs
            .get(&ConfigVersionId::from(id))
            .map(|config| config.status)
    }
}

impl GovernanceRepository for MemoryRepository {
    fn cycle(&self, id: &CycleId) -> Result<Option<PricingCycle>, RepositoryError> {
        let state = self.state.lock().expect("repository mutex poisoned");
        Ok(state.cycles.get(id).cloned())
    }

    fn value_units(&self, cycle_id: &CycleId) -> Result<Vec<ValueUnitDefinition>, RepositoryError> {
        let state = self.state.lock().expect("repository mutex poisoned");
        Ok(state.value_units.get(cycle_id).cloned().unwrap_or_default())
    }

    fn config(&self, id: &ConfigVersionId) -> Result<Option<ConfigVersion>, RepositoryError> {
        let state = self.state.lock().expect("repository mutex poisoned");
        Ok(state.configs.get(id).cloned())
    }

    fn configs(&self) -> Result<Vec<ConfigVersion>, RepositoryError> {
        let state = self.state.lock().expect("repository mutex poisoned");
        Ok(state.configs.values().cloned().collect())
    }

    fn customer_count(&self, segment: Option<&str>) -> Result<u64, RepositoryError> {
        let state = self.state.lock().expect("repository mutex poisoned");
        Ok(state
            .customers
            .iter()
            .filter(|customer| segment.map(|s| s == customer.as_str()).unwrap_or(true))
            .count() as u64)
    }

    fn insert_simulation_run(&self, run: SimulationRun) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().expect("repository mutex poisoned");
        if state.runs.contains_key(&run.simulation_run_id) {
            return Err(RepositoryError::Conflict);
        }
        state.runs.insert(run.simulation_run_id.clone(), run);
        Ok(())
    }

    fn simulation_run(&self, id: &SimulationRunId) -> Result<Option<SimulationRun>, RepositoryError> {
        let state = self.state.lock().expect("repository mutex poisoned");
        Ok(state.runs.get(id).cloned())
    }

    fn commit_activation(&self, activation: Activation) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().expect("repository mutex poisoned");
        if !state.configs.contains_key(&activation.activate) {
            return Err(RepositoryError::NotFound);
        }
        if let Some(archive) = &activation.archive {
            if let Some(config) = state.configs.get_mut(archive) {
                config.status = ConfigStatus::Archived;
            }
        }
        if let Some(config) = state.configs.get_mut(&activation.activate) {
            config.status = ConfigStatus::Active;
            config.effective_at = Some(activation.effective_at);
            config.billing_patch_id = Some(activation.billing_patch.billing_patch_id.clone());
        }
        state.patches.insert(
            activation.billing_patch.billing_patch_id.clone(),
            activation.billing_patch,
        );
        state
            .decisions
            .insert(activation.decision.decision_id.clone(), activation.decision);
        Ok(())
    }

    fn decision(&self, id: &DecisionId) -> Result<Option<DecisionRecord>, RepositoryError> {
        let state = self.state.lock().expect("repository mutex poisoned");
        Ok(state.decisions.get(id).cloned())
    }

    fn decisions(&self) -> Result<Vec<DecisionRecord>, RepositoryError> {
        let state = self.state.lock().expect("repository mutex poisoned");
        Ok(state.decisions.values().cloned().collect())
    }

    fn billing_patch(&self, id: &BillingPatchId) -> Result<Option<BillingPatch>, RepositoryError> {
        let state = self.state.lock().expect("repository mutex poisoned");
        Ok(state.patches.get(id).cloned())
    }
}

/// Repository whose backing store is down.
pub(super) struct UnavailableRepository;

impl GovernanceRepository for UnavailableRepository {
    fn cycle(&self, _id: &CycleId) -> Result<Option<PricingCycle>, RepositoryError> {
        Err(unavailable())
    }

    fn value_units(&self, _cycle_id: &CycleId) -> Result<Vec<ValueUnitDefinition>, RepositoryError> {
        Err(unavailable())
    }

    fn config(&self, _id: &ConfigVersionId) -> Result<Option<ConfigVersion>, RepositoryError> {
        Err(unavailable())
    }

    fn configs(&self) -> Result<Vec<ConfigVersion>, RepositoryError> {
        Err(unavailable())
    }

    fn customer_count(&self, _segment: Option<&str>) -> Result<u64, RepositoryError> {
        Err(unavailable())
    }

    fn insert_simulation_run(&self, _run: SimulationRun) -> Result<(), RepositoryError> {
        Err(unavailable())
    }

    fn simulation_run(&self, _id: &SimulationRunId) -> Result<Option<SimulationRun>, RepositoryError> {
        Err(unavailable())
    }

    fn commit_activation(&self, _activation: Activation) -> Result<(), RepositoryError> {
        Err(unavailable())
    }

    fn decision(&self, _id: &DecisionId) -> Result<Option<DecisionRecord>, RepositoryError> {
        Err(unavailable())
    }

    fn decisions(&self) -> Result<Vec<DecisionRecord>, RepositoryError> {
        Err(unavailable())
    }

    fn billing_patch(&self, _id: &BillingPatchId) -> Result<Option<BillingPatch>, RepositoryError> {
        Err(unavailable())
    }
}

fn unavailable() -> RepositoryError {
    RepositoryError::Unavailable("primary store offline".to_string())
}
