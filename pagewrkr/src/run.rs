use std::sync::Arc;

use pagewrkr_core::runner::StopSignal;
use pagewrkr_core::{RunConfig, ScenarioOptions, run_scenario, scenario_from_options};

use crate::cli::RunArgs;
use crate::exit_codes::ExitCode;
use crate::logging;
use crate::output;
use crate::run_error::RunError;
use crate::run_file::load_run_file;

pub async fn run(args: RunArgs) -> Result<ExitCode, RunError> {
    logging::init(args.log_level.as_deref()).map_err(RunError::InvalidInput)?;

    let out = output::formatter(args.output);

    let opts = match &args.config {
        Some(path) => ScenarioOptions::from(
            load_run_file(path)
                .await
                .map_err(RunError::InvalidInput)?,
        ),
        None => ScenarioOptions::default(),
    };

    let scenario = scenario_from_options(opts, run_config(&args)).map_err(|e| {
        RunError::InvalidInput(anyhow::Error::new(e).context("invalid scenario config"))
    })?;

    out.print_header(&scenario);

    let stop = Arc::new(StopSignal::new());
    let ctrl_c = {
        let stop = stop.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupted, stopping workers");
                stop.stop();
            }
        })
    };

    let report = run_scenario(&scenario, out.progress(), stop).await;
    ctrl_c.abort();
    let report = report?;

    out.print_summary(&scenario, &report).map_err(RunError::RuntimeError)?;

    Ok(ExitCode::from_verdict(report.verdict.passed))
}

fn run_config(args: &RunArgs) -> RunConfig {
    RunConfig {
        preset: args.preset,
        base_url: args.base_url.clone(),
        workers: args.workers,
        requests_per_worker: args.requests_per_worker,
        size: args.size,
        run_timeout: args.run_timeout,
    }
}
