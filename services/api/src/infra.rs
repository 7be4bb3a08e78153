use metrics_exporter_prometheus::PrometheusHandle;
use pricing_governance::error::AppError;
use pricing_governance::workflows::governance::{
    Activation, BillingPatch, BillingPatchId, ConfigStatus, ConfigVersion, ConfigVersionId,
    CycleId, DecisionId, DecisionRecord, GovernanceRepository, PricingCycle, RepositoryError,
    SimulationRun, SimulationRunId,
};
use pricing_governance::workflows::simulation::ValueUnitDefinition;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    /// Size of the usage feed loaded at startup.
    pub(crate) usage_events: usize,
}

/// Governance records loaded at startup.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct GovernanceSeed {
    #[serde(default)]
    pub(crate) cycles: Vec<PricingCycle>,
    #[serde(default)]
    pub(crate) value_units: Vec<SeededValueUnit>,
    #[serde(default)]
    pub(crate) configs: Vec<ConfigVersion>,
    #[serde(default)]
    pub(crate) customers: Vec<SeededCustomer>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SeededValueUnit {
    pub(crate) cycle_id: CycleId,
    #[serde(flatten)]
    pub(crate) definition: ValueUnitDefinition,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SeededCustomer {
    pub(crate) customer_id: String,
    pub(crate) segment_id: String,
}

impl GovernanceSeed {
    pub(crate) fn from_path(path: &Path) -> Result<Self, AppError> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

#[derive(Default)]
struct GovernanceStore {
    cycles: HashMap<CycleId, PricingCycle>,
    value_units: HashMap<CycleId, Vec<ValueUnitDefinition>>,
    configs: HashMap<ConfigVersionId, ConfigVersion>,
    customer_segments: HashMap<String, String>,
    runs: HashMap<SimulationRunId, SimulationRun>,
    decisions: HashMap<DecisionId, DecisionRecord>,
    billing_patches: HashMap<BillingPatchId, BillingPatch>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryGovernanceRepository {
    store: Arc<Mutex<GovernanceStore>>,
}

impl InMemoryGovernanceRepository {
    pub(crate) fn from_seed(seed: GovernanceSeed) -> Self {
        let mut store = GovernanceStore::default();
        for cycle in seed.cycles {
            store.cycles.insert(cycle.cycle_id.clone(), cycle);
        }
        for unit in seed.value_units {
            store
                .value_units
                .entry(unit.cycle_id)
                .or_default()
                .push(unit.definition);
        }
        for config in seed.configs {
            store
                .configs
                .insert(config.config_version_id.clone(), config);
        }
        for customer in seed.customers {
            store
                .customer_segments
                .insert(customer.customer_id, customer.segment_id);
        }

        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    pub(crate) fn config_count(&self) -> usize {
        self.store
            .lock()
            .expect("governance store mutex poisoned")
            .configs
            .len()
    }
}

impl GovernanceRepository for InMemoryGovernanceRepository {
    fn cycle(&self, id: &CycleId) -> Result<Option<PricingCycle>, RepositoryError> {
        let guard = self.store.lock().expect("governance store mutex poisoned");
        Ok(guard.cycles.get(id).cloned())
    }

    fn value_units(&self, cycle_id: &CycleId) -> Result<Vec<ValueUnitDefinition>, RepositoryError> {
        let guard = self.store.lock().expect("governance store mutex poisoned");
        Ok(guard.value_units.get(cycle_id).cloned().unwrap_or_default())
    }

    fn config(&self, id: &ConfigVersionId) -> Result<Option<ConfigVersion>, RepositoryError> {
        let guard = self.store.lock().expect("governance store mutex poisoned");
        Ok(guard.configs.get(id).cloned())
    }

    fn configs(&self) -> Result<Vec<ConfigVersion>, RepositoryError> {
        let guard = self.store.lock().expect("governance store mutex poisoned");
        Ok(guard.configs.values().cloned().collect())
    }

    fn customer_count(&self, segment: Option<&str>) -> Result<u64, RepositoryError> {
        let guard = self.store.lock().expect("governance store mutex poisoned");
        let count = match segment {
            Some(segment) => guard
                .customer_segments
                .values()
                .filter(|customer_segment| customer_segment.as_str() == segment)
                .count(),
            None => guard.customer_segments.len(),
        };
        Ok(count as u64)
    }

    fn insert_simulation_run(&self, run: SimulationRun) -> Result<(), RepositoryError> {
        let mut guard = self.store.lock().expect("governance store mutex poisoned");
        if guard.runs.contains_key(&run.simulation_run_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.runs.insert(run.simulation_run_id.clone(), run);
        Ok(())
    }

    fn simulation_run(&self, id: &SimulationRunId) -> Result<Option<SimulationRun>, RepositoryError> {
        let guard = self.store.lock().expect("governance store mutex poisoned");
        Ok(guard.runs.get(id).cloned())
    }

    fn commit_activation(&self, activation: Activation) -> Result<(), RepositoryError> {
        let mut guard = self.store.lock().expect("governance store mutex poisoned");
        if !guard.configs.contains_key(&activation.activate) {
            return Err(RepositoryError::NotFound);
        }
        if guard
            .decisions
            .contains_key(&activation.decision.decision_id)
        {
            return Err(RepositoryError::Conflict);
        }

        if let Some(previous) = activation
            .archive
            .as_ref()
            .and_then(|id| guard.configs.get_mut(id))
        {
            previous.status = ConfigStatus::Archived;
        }
        if let Some(candidate) = guard.configs.get_mut(&activation.activate) {
            candidate.status = ConfigStatus::Active;
            candidate.effective_at = Some(activation.effective_at);
            candidate.billing_patch_id = Some(activation.billing_patch.billing_patch_id.clone());
        }
        guard.billing_patches.insert(
            activation.billing_patch.billing_patch_id.clone(),
            activation.billing_patch,
        );
        guard
            .decisions
            .insert(activation.decision.decision_id.clone(), activation.decision);
        Ok(())
    }

    fn decision(&self, id: &DecisionId) -> Result<Option<DecisionRecord>, RepositoryError> {
        let guard = self.store.lock().expect("governance store mutex poisoned");
        Ok(guard.decisions.get(id).cloned())
    }

    fn decisions(&self) -> Result<Vec<DecisionRecord>, RepositoryError> {
        let guard = self.store.lock().expect("governance store mutex poisoned");
        Ok(guard.decisions.values().cloned().collect())
    }

    fn billing_patch(&self, id: &BillingPatchId) -> Result<Option<BillingPatch>, RepositoryError> {
        let guard = self.store.lock().expect("governance store mutex poisoned");
        Ok(guard.billing_patches.get(id).cloned())
    }
}
