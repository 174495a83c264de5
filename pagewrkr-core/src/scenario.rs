use serde::Serialize;
use std::sync::Arc;

use crate::config::ScenarioConfig;
use crate::error::Result;
use crate::executor::{HttpExecutor, RequestExecutor};
use crate::runner::{LoadGenerator, ProgressFn, StopSignal, spec_factory};
use crate::stats::Snapshot;
use crate::verdict::{VerdictReport, validate};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioReport {
    pub snapshot: Snapshot,
    pub verdict: VerdictReport,
}

/// Runs `scenario` against its HTTP endpoint and validates the result.
pub async fn run_scenario(
    scenario: &ScenarioConfig,
    progress: Option<ProgressFn>,
    stop: Arc<StopSignal>,
) -> Result<ScenarioReport> {
    let executor = HttpExecutor::new(&scenario.endpoint, Some(scenario.request_timeout))?;
    run_scenario_with(scenario, Arc::new(executor), progress, stop).await
}

/// Like [`run_scenario`], with a caller-supplied executor.
pub async fn run_scenario_with<E: RequestExecutor>(
    scenario: &ScenarioConfig,
    executor: Arc<E>,
    progress: Option<ProgressFn>,
    stop: Arc<StopSignal>,
) -> Result<ScenarioReport> {
    let mut generator = LoadGenerator::new(scenario.load.clone())?.with_stop_signal(stop);
    if let Some(progress) = progress {
        generator = generator.with_progress(progress);
    }

    tracing::info!(
        scenario = %scenario.name,
        endpoint = %scenario.endpoint,
        workers = scenario.load.workers,
        requests_per_worker = scenario.load.requests_per_worker,
        page_strategy = %scenario.page_strategy,
        "starting scenario"
    );

    let specs = spec_factory(scenario.page_strategy, scenario.pages, scenario.size);
    let snapshot = generator.run(executor, specs).await?;
    let verdict = validate(&snapshot, &scenario.policy);

    if !verdict.passed {
        for failed in &verdict.failed_checks {
            tracing::warn!(check = %failed.name, "{}", failed.message);
        }
    }

    Ok(ScenarioReport { snapshot, verdict })
}
