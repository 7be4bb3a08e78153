use serde::{Deserialize, Serialize};

use super::domain::{ConfigurationSnapshot, UsageEvent, ValueUnitDefinition};
use super::engine::{PricingScenario, SimulationEngine};
use super::params::{SimulationParameters, SimulationRequestError, SimulationSettingsRequest};
use super::report::{CompletenessResult, SimulationOutput};

/// Self-contained simulation input: snapshots and value units inline rather
/// than looked up by id. Used by the preview endpoint and the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationScenario {
    pub candidate: ConfigurationSnapshot,
    #[serde(default)]
    pub candidate_value_units: Vec<ValueUnitDefinition>,
    #[serde(default)]
    pub baseline: Option<ConfigurationSnapshot>,
    /// Defaults to the candidate's definitions when the baseline shares them.
    #[serde(default)]
    pub baseline_value_units: Option<Vec<ValueUnitDefinition>>,
    #[serde(flatten)]
    pub settings: SimulationSettingsRequest,
}

/// Output of a run together with the validated parameters and readiness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub parameters: SimulationParameters,
    pub completeness_result: CompletenessResult,
    pub output: SimulationOutput,
}

impl SimulationScenario {
    pub fn run(&self, events: &[UsageEvent]) -> Result<SimulationReport, SimulationRequestError> {
        // Without a customer directory the sample stands for a single customer.
        let parameters = self.settings.clone().validate(|_| 1)?;
        let engine = SimulationEngine::new(parameters);

        let candidate = PricingScenario::new(&self.candidate, &self.candidate_value_units);
        let baseline = self.baseline.as_ref().map(|snapshot| {
            let value_units = self
                .baseline_value_units
                .as_deref()
                .unwrap_or(&self.candidate_value_units);
            PricingScenario::new(snapshot, value_units)
        });

        let output = engine.run(candidate, baseline, events);
        let completeness_result = output.completeness();

        Ok(SimulationReport {
            parameters: engine.params().clone(),
            completeness_result,
            output,
        })
    }
}
