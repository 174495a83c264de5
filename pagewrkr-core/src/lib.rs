mod config;
mod error;
mod executor;
mod outcome;
mod payload;
mod presets;
mod scenario;
mod stats;
mod thresholds;
mod verdict;

pub mod runner;

pub use config::{
    DEFAULT_PATH, DEFAULT_REQUEST_TIMEOUT, RunConfig, ScenarioConfig, ScenarioOptions,
    scenario_from_options,
};
pub use error::{Error, Result};
pub use executor::{HttpExecutor, RequestExecutor, join_endpoint};
pub use outcome::{ErrorKind, RequestOutcome, RequestSpec, SchemaError, TransportErrorKind};
pub use payload::{Payload, inspect};
pub use presets::Preset;
pub use scenario::{ScenarioReport, run_scenario, run_scenario_with};
pub use stats::{DataClassification, LiveTotals, Snapshot, StatsAggregator};
pub use thresholds::{Metric, ThresholdExpr, ThresholdOp, parse_threshold_expr};
pub use verdict::{FailedCheck, ThresholdCheck, ThresholdPolicy, VerdictReport, validate};
