use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{CommitSemantics, PoolId, PricingMode, SimulationFilters};
use super::projection::DEFAULT_CHURN_HORIZON_MONTHS;

const MAX_CHURN_HORIZON_MONTHS: f64 = 120.0;

/// Validated run parameters. The engine only ever sees this typed form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationParameters {
    pub historical_window_days: f64,
    #[serde(default)]
    pub filters: SimulationFilters,
    #[serde(default)]
    pub pricing_mode: PricingMode,
    #[serde(default = "default_include_exploration")]
    pub include_exploration_in_results: bool,
    #[serde(default = "default_customer_count")]
    pub segment_customer_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_churn_rate: Option<f64>,
    #[serde(default = "default_churn_horizon")]
    pub churn_horizon_months: u32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub pool_pricing_mode_overrides: BTreeMap<PoolId, PricingMode>,
    #[serde(default)]
    pub commit_semantics: CommitSemantics,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub pool_commit_semantics_overrides: BTreeMap<PoolId, CommitSemantics>,
}

impl SimulationParameters {
    pub fn new(historical_window_days: f64) -> Self {
        Self {
            historical_window_days,
            filters: SimulationFilters::default(),
            pricing_mode: PricingMode::default(),
            include_exploration_in_results: default_include_exploration(),
            segment_customer_count: default_customer_count(),
            annual_churn_rate: None,
            churn_horizon_months: default_churn_horizon(),
            pool_pricing_mode_overrides: BTreeMap::new(),
            commit_semantics: CommitSemantics::default(),
            pool_commit_semantics_overrides: BTreeMap::new(),
        }
    }

    pub fn with_pricing_mode(mut self, mode: PricingMode) -> Self {
        self.pricing_mode = mode;
        self
    }

    pub fn with_commit_semantics(mut self, semantics: CommitSemantics) -> Self {
        self.commit_semantics = semantics;
        self
    }

    pub fn with_customer_count(mut self, count: u64) -> Self {
        self.segment_customer_count = count.max(1);
        self
    }

    pub fn with_filters(mut self, filters: SimulationFilters) -> Self {
        self.filters = filters;
        self
    }

    /// Pricing mode for a pool: the pool override wins over the run default.
    pub fn pricing_mode_for(&self, pool_id: &PoolId) -> PricingMode {
        self.pool_pricing_mode_overrides
            .get(pool_id)
            .copied()
            .unwrap_or(self.pricing_mode)
    }

    /// Commit semantics for a pool, resolved independently of its pricing mode.
    pub fn commit_semantics_for(&self, pool_id: &PoolId) -> CommitSemantics {
        self.pool_commit_semantics_overrides
            .get(pool_id)
            .copied()
            .unwrap_or(self.commit_semantics)
    }
}

fn default_include_exploration() -> bool {
    true
}

fn default_customer_count() -> u64 {
    1
}

fn default_churn_horizon() -> u32 {
    DEFAULT_CHURN_HORIZON_MONTHS
}

/// Rejections raised while turning a raw request into [`SimulationParameters`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimulationRequestError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("historical_window_days must be a positive number (found {0})")]
    InvalidWindow(f64),
    #[error("Invalid pricing_mode. Must be one of: {}", pricing_mode_choices())]
    InvalidPricingMode(String),
    #[error(
        "Invalid pricing_mode \"{mode}\" for pool \"{pool_id}\". Must be one of: {}",
        pricing_mode_choices()
    )]
    InvalidPoolPricingMode { pool_id: String, mode: String },
    #[error("Invalid commit_semantics. Must be one of: {}", commit_semantics_choices())]
    InvalidCommitSemantics(String),
    #[error(
        "Invalid commit_semantics \"{semantics}\" for pool \"{pool_id}\". Must be one of: {}",
        commit_semantics_choices()
    )]
    InvalidPoolCommitSemantics { pool_id: String, semantics: String },
    #[error("annual_churn_rate must be between 0 and 1 inclusive (found {0})")]
    InvalidChurnRate(f64),
    #[error("churn_horizon_months must be a whole number between 1 and 120 (found {0})")]
    InvalidChurnHorizon(f64),
    #[error("segment_customer_count must be a whole number of customers (found {0})")]
    InvalidCustomerCount(f64),
}

fn pricing_mode_choices() -> String {
    PricingMode::ALL.map(PricingMode::as_str).join(", ")
}

fn commit_semantics_choices() -> String {
    CommitSemantics::ALL.map(CommitSemantics::as_str).join(", ")
}

/// Loosely typed run settings as received over HTTP or read from a scenario file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationSettingsRequest {
    #[serde(default)]
    pub historical_window_days: Option<f64>,
    #[serde(default)]
    pub filters: Option<SimulationFilters>,
    #[serde(default)]
    pub pricing_mode: Option<String>,
    #[serde(default)]
    pub include_exploration_in_results: Option<bool>,
    #[serde(default)]
    pub segment_customer_count: Option<f64>,
    #[serde(default)]
    pub annual_churn_rate: Option<f64>,
    #[serde(default)]
    pub churn_horizon_months: Option<f64>,
    #[serde(default)]
    pub pool_pricing_mode_overrides: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub commit_semantics: Option<String>,
    #[serde(default)]
    pub pool_commit_semantics_overrides: Option<BTreeMap<String, String>>,
}

impl SimulationSettingsRequest {
    /// Validate the request. `segment_customers` supplies the customer count
    /// for the filtered segment when the request carries no override.
    pub fn validate<F>(self, segment_customers: F) -> Result<SimulationParameters, SimulationRequestError>
    where
        F: FnOnce(Option<&str>) -> u64,
    {
        let historical_window_days = self
            .historical_window_days
            .ok_or(SimulationRequestError::MissingField("historical_window_days"))?;
        if !historical_window_days.is_finite() || historical_window_days <= 0.0 {
            return Err(SimulationRequestError::InvalidWindow(historical_window_days));
        }

        let filters = self
            .filters
            .ok_or(SimulationRequestError::MissingField("filters"))?;

        let pricing_mode = match self.pricing_mode.as_deref() {
            Some(raw) => raw
                .parse::<PricingMode>()
                .map_err(SimulationRequestError::InvalidPricingMode)?,
            None => PricingMode::default(),
        };

        let mut pool_pricing_mode_overrides = BTreeMap::new();
        for (pool_id, mode) in self.pool_pricing_mode_overrides.unwrap_or_default() {
            let parsed = mode.parse::<PricingMode>().map_err(|mode| {
                SimulationRequestError::InvalidPoolPricingMode {
                    pool_id: pool_id.clone(),
                    mode,
                }
            })?;
            pool_pricing_mode_overrides.insert(PoolId(pool_id), parsed);
        }

        let commit_semantics = match self.commit_semantics.as_deref() {
            Some(raw) => raw
                .parse::<CommitSemantics>()
                .map_err(SimulationRequestError::InvalidCommitSemantics)?,
            None => CommitSemantics::default(),
        };

        let mut pool_commit_semantics_overrides = BTreeMap::new();
        for (pool_id, semantics) in self.pool_commit_semantics_overrides.unwrap_or_default() {
            let parsed = semantics.parse::<CommitSemantics>().map_err(|semantics| {
                SimulationRequestError::InvalidPoolCommitSemantics {
                    pool_id: pool_id.clone(),
                    semantics,
                }
            })?;
            pool_commit_semantics_overrides.insert(PoolId(pool_id), parsed);
        }

        if let Some(rate) = self.annual_churn_rate {
            if !(0.0..=1.0).contains(&rate) {
                return Err(SimulationRequestError::InvalidChurnRate(rate));
            }
        }

        let churn_horizon_months = match self.churn_horizon_months {
            Some(months) => {
                if !(1.0..=MAX_CHURN_HORIZON_MONTHS).contains(&months) || months.fract() != 0.0 {
                    return Err(SimulationRequestError::InvalidChurnHorizon(months));
                }
                months as u32
            }
            None => DEFAULT_CHURN_HORIZON_MONTHS,
        };

        // Non-positive overrides clamp to a single customer.
        let segment_customer_count = match self.segment_customer_count {
            Some(count) if !count.is_finite() || (count > 0.0 && count.fract() != 0.0) => {
                return Err(SimulationRequestError::InvalidCustomerCount(count));
            }
            Some(count) if count > 0.0 => count as u64,
            Some(_) => 1,
            None => segment_customers(filters.segment.as_deref()).max(1),
        };

        Ok(SimulationParameters {
            historical_window_days,
            filters,
            pricing_mode,
            include_exploration_in_results: self.include_exploration_in_results.unwrap_or(true),
            segment_customer_count,
            annual_churn_rate: self.annual_churn_rate,
            churn_horizon_months,
            pool_pricing_mode_overrides,
            commit_semantics,
            pool_commit_semantics_overrides,
        })
    }
}
