use std::sync::Arc;

use pagewrkr_core::runner::ProgressFn;
use pagewrkr_core::{ScenarioConfig, ScenarioReport};

mod format;
mod progress;
mod summary;

use format::{format_duration, format_rate};
use progress::HumanProgress;
use summary::render;

use super::OutputFormatter;

pub(crate) struct HumanReadableOutput {
    progress: Arc<HumanProgress>,
}

impl HumanReadableOutput {
    pub(crate) fn new() -> Self {
        Self {
            progress: Arc::new(HumanProgress::new()),
        }
    }
}

impl OutputFormatter for HumanReadableOutput {
    fn print_header(&self, scenario: &ScenarioConfig) {
        println!("endpoint: {}", scenario.endpoint);
        println!(
            "scenario: {} workers={} requests_per_worker={} size={} pages={} run_timeout={:?}",
            scenario.name,
            scenario.load.workers,
            scenario.load.requests_per_worker,
            scenario.size,
            scenario.page_strategy,
            scenario.load.run_timeout
        );
        println!();
    }

    fn progress(&self) -> Option<ProgressFn> {
        let progress = self.progress.clone();

        Some(Arc::new(move |u| {
            let done = u.requests_total.saturating_add(u.skipped_requests_total);
            let message = format!(
                "elapsed={} rps={} errors={}",
                format_duration(u.elapsed),
                format_rate(u.rps_now),
                u.failed_requests_total
            );
            progress.update("requests", done, u.planned_requests, message);
        }))
    }

    fn print_summary(
        &self,
        scenario: &ScenarioConfig,
        report: &ScenarioReport,
    ) -> anyhow::Result<()> {
        self.progress.finish();
        print!("{}", render(scenario, report));
        Ok(())
    }
}
