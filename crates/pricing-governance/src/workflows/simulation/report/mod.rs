mod summary;
pub mod views;

pub use summary::BaselineComparison;
pub use views::{
    Assumptions, CompletenessResult, EconomicsSummary, ExplorationSummary, LensMetrics,
    PoolBreakdownEntry, SimulationOutput,
};
