use crate::cli::OutputFormat;
use pagewrkr_core::runner::ProgressFn;
use pagewrkr_core::{ScenarioConfig, ScenarioReport};

mod human;
mod json;

pub(crate) trait OutputFormatter: Send + Sync {
    fn print_header(&self, scenario: &ScenarioConfig);
    fn progress(&self) -> Option<ProgressFn>;
    fn print_summary(
        &self,
        scenario: &ScenarioConfig,
        report: &ScenarioReport,
    ) -> anyhow::Result<()>;
}

pub(crate) fn formatter(format: OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::HumanReadable => Box::new(human::HumanReadableOutput::new()),
        OutputFormat::Json => Box::new(json::JsonOutput),
    }
}
