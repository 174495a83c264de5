use serde::Serialize;
use std::io::Write as _;
use std::sync::Arc;

use pagewrkr_core::runner::{ProgressFn, ProgressUpdate};
use pagewrkr_core::{ScenarioConfig, ScenarioReport, Snapshot, VerdictReport};

use super::OutputFormatter;

pub(crate) struct JsonOutput;

impl OutputFormatter for JsonOutput {
    fn print_header(&self, _scenario: &ScenarioConfig) {}

    fn progress(&self) -> Option<ProgressFn> {
        Some(Arc::new(move |u| {
            let line = build_progress_line(&u);
            emit_json_line(&line);
        }))
    }

    fn print_summary(
        &self,
        scenario: &ScenarioConfig,
        report: &ScenarioReport,
    ) -> anyhow::Result<()> {
        let line = build_summary_line(scenario, report);
        emit_json_line(&line);
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonProgressLine {
    pub kind: &'static str,
    pub tick: u64,
    pub elapsed_secs: f64,
    pub interval_secs: f64,
    pub requests_per_sec: f64,
    pub total_requests: u64,
    pub failed_requests: u64,
    pub skipped_requests: u64,
    pub planned_requests: u64,
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonSummaryLine<'a> {
    pub kind: &'static str,
    pub scenario: &'a str,
    pub endpoint: &'a str,
    pub snapshot: &'a Snapshot,
    pub verdict: &'a VerdictReport,
}

fn build_progress_line(u: &ProgressUpdate) -> JsonProgressLine {
    JsonProgressLine {
        kind: "progress",
        tick: u.tick,
        elapsed_secs: u.elapsed.as_secs_f64(),
        interval_secs: u.interval.as_secs_f64(),
        requests_per_sec: u.rps_now,
        total_requests: u.requests_total,
        failed_requests: u.failed_requests_total,
        skipped_requests: u.skipped_requests_total,
        planned_requests: u.planned_requests,
    }
}

fn build_summary_line<'a>(
    scenario: &'a ScenarioConfig,
    report: &'a ScenarioReport,
) -> JsonSummaryLine<'a> {
    JsonSummaryLine {
        kind: "summary",
        scenario: &scenario.name,
        endpoint: &scenario.endpoint,
        snapshot: &report.snapshot,
        verdict: &report.verdict,
    }
}

fn emit_json_line<T: Serialize>(line: &T) {
    let mut out = std::io::stdout().lock();
    if serde_json::to_writer(&mut out, line).is_ok() {
        let _ = writeln!(out);
    }
}
