use std::fmt::Write as _;
use std::time::Duration;

use pagewrkr_core::{ScenarioConfig, ScenarioReport};

use super::format::*;

pub(crate) fn render(scenario: &ScenarioConfig, report: &ScenarioReport) -> String {
    let s = &report.snapshot;
    let mut out = String::new();

    out.push_str("summary\n");
    writeln!(&mut out, "scenario: {}", scenario.name).ok();
    writeln!(
        &mut out,
        "  requests: {} (success {}, failed {}, skipped {})",
        s.total_requests, s.success_count, s.failure_count, s.skipped_requests
    )
    .ok();
    writeln!(
        &mut out,
        "  data: valid {} empty {} (valid {} / empty {})",
        s.valid_data_count,
        s.empty_data_count,
        format_pct(s.valid_data_rate),
        format_pct(s.empty_data_rate)
    )
    .ok();

    if s.failure_count > 0 || s.schema_errors > 0 {
        writeln!(
            &mut out,
            "  errors: transport {} (timeouts {}) status {} schema {}",
            s.transport_errors, s.timeouts, s.status_errors, s.schema_errors
        )
        .ok();
        if s.panics > 0 {
            writeln!(&mut out, "  panics: {}", s.panics).ok();
        }
    }

    if s.total_requests > 0 {
        writeln!(
            &mut out,
            "  latency = p50={} p90={} p95={} p99={} mean={:.1}ms min={} max={}",
            format_ms(s.p50_latency_ms),
            format_ms(s.p90_latency_ms),
            format_ms(s.p95_latency_ms),
            format_ms(s.p99_latency_ms),
            s.average_latency_ms,
            format_ms(s.min_latency_ms),
            format_ms(s.max_latency_ms),
        )
        .ok();
    } else {
        out.push_str("  latency: n/a\n");
    }

    writeln!(
        &mut out,
        "  rates: success={} rps={} elapsed={}",
        format_pct(s.success_rate),
        format_rate(s.throughput_per_second),
        format_duration(Duration::from_secs_f64(s.duration_secs.max(0.0)))
    )
    .ok();

    out.push('\n');
    let checks = scenario.policy.checks().len();
    if report.verdict.passed {
        writeln!(&mut out, "thresholds: passed ({checks} checks)").ok();
    } else {
        writeln!(
            &mut out,
            "thresholds: failed ({}/{checks} checks)",
            report.verdict.failed_checks.len()
        )
        .ok();
        for failed in &report.verdict.failed_checks {
            writeln!(&mut out, "  {}: {}", failed.name, failed.message).ok();
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagewrkr_core::{
        RequestOutcome, RunConfig, ScenarioOptions, StatsAggregator, scenario_from_options,
        validate,
    };

    fn scenario() -> ScenarioConfig {
        scenario_from_options(
            ScenarioOptions {
                base_url: Some("http://localhost:5000".to_string()),
                ..ScenarioOptions::default()
            },
            RunConfig::default(),
        )
        .unwrap_or_else(|e| panic!("{e}"))
    }

    #[test]
    fn render_lists_counts_latency_and_failed_checks() {
        let scenario = scenario();
        let stats = StatsAggregator::default();
        stats.record(&RequestOutcome::ok(1, Duration::from_millis(20)));
        stats.record(&RequestOutcome::http_status(503, Duration::from_millis(40)));
        let snapshot = stats.snapshot(Duration::from_secs(1));
        let verdict = validate(&snapshot, &scenario.policy);

        let text = render(&scenario, &ScenarioReport { snapshot, verdict });
        assert!(text.contains("scenario: custom"));
        assert!(text.contains("requests: 2 (success 1, failed 1, skipped 0)"));
        assert!(text.contains("status 1"));
        assert!(!text.contains("panics"));
        assert!(text.contains("max=40ms"));
        assert!(text.contains("thresholds: failed"));
        assert!(text.contains("success_rate: success_rate >= 95"));
    }

    #[test]
    fn render_handles_an_empty_run() {
        let scenario = scenario();
        let snapshot = StatsAggregator::default().snapshot(Duration::ZERO);
        let verdict = validate(&snapshot, &pagewrkr_core::ThresholdPolicy::new());

        let text = render(&scenario, &ScenarioReport { snapshot, verdict });
        assert!(text.contains("latency: n/a"));
        assert!(text.contains("thresholds: passed"));
    }
}
