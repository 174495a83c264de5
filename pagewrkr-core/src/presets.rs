use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::ScenarioOptions;
use crate::runner::{Jitter, PageRange, PageStrategy};
use crate::thresholds::{Metric, ThresholdExpr, ThresholdOp};
use crate::verdict::ThresholdPolicy;

/// Built-in load shapes for the listing endpoint.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Preset {
    /// One worker walking ten pages with a fixed 100ms pause.
    Continuous,
    /// Five workers fetching page 1 twice each, no pause.
    Concurrent,
    /// Twenty workers, one page each, five requests with up to 50ms jitter.
    HighLoad,
}

impl Preset {
    #[must_use]
    pub fn options(self) -> ScenarioOptions {
        match self {
            Self::Continuous => ScenarioOptions {
                workers: Some(1),
                requests_per_worker: Some(10),
                size: Some(1),
                pages: Some(PageRange::default()),
                page_strategy: Some(PageStrategy::Sequential),
                jitter: Some(Jitter::fixed(Duration::from_millis(100))),
                ..ScenarioOptions::default()
            },
            Self::Concurrent => ScenarioOptions {
                workers: Some(5),
                requests_per_worker: Some(2),
                size: Some(2),
                pages: Some(PageRange::default()),
                page_strategy: Some(PageStrategy::Fixed),
                run_timeout: Some(Duration::from_secs(10)),
                ..ScenarioOptions::default()
            },
            Self::HighLoad => ScenarioOptions {
                workers: Some(20),
                requests_per_worker: Some(5),
                size: Some(1),
                pages: Some(PageRange::default()),
                page_strategy: Some(PageStrategy::PerWorker),
                jitter: Some(Jitter::new(Duration::ZERO, Duration::from_millis(50))),
                ..ScenarioOptions::default()
            },
        }
    }

    #[must_use]
    pub fn policy(self) -> ThresholdPolicy {
        match self {
            Self::Continuous => ThresholdPolicy::from_exprs([
                ThresholdExpr::new(Metric::AvgLatencyMs, ThresholdOp::Lt, 300.0),
                ThresholdExpr::new(Metric::MaxLatencyMs, ThresholdOp::Lt, 1000.0),
                ThresholdExpr::new(Metric::ValidDataRate, ThresholdOp::Gte, 50.0),
            ]),
            Self::Concurrent => ThresholdPolicy::from_exprs([
                ThresholdExpr::new(Metric::SuccessRate, ThresholdOp::Gte, 100.0),
                ThresholdExpr::new(Metric::MaxLatencyMs, ThresholdOp::Lt, 2000.0),
            ]),
            Self::HighLoad => ThresholdPolicy::default_policy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_kebab_case_names() {
        assert_eq!("high-load".parse::<Preset>().ok(), Some(Preset::HighLoad));
        assert_eq!(Preset::Continuous.to_string(), "continuous");
        assert!("highload".parse::<Preset>().is_err());
    }

    #[test]
    fn presets_plan_the_expected_request_counts() {
        let planned = |p: Preset| {
            let o = p.options();
            o.workers.unwrap_or_default() * o.requests_per_worker.unwrap_or_default()
        };
        assert_eq!(planned(Preset::Continuous), 10);
        assert_eq!(planned(Preset::Concurrent), 10);
        assert_eq!(planned(Preset::HighLoad), 100);
    }

    #[test]
    fn policies_carry_the_preset_checks() {
        let names = |p: Preset| -> Vec<String> {
            p.policy().checks().iter().map(|c| c.message().to_string()).collect()
        };
        assert_eq!(
            names(Preset::Continuous),
            vec!["avg_latency_ms < 300", "max_latency_ms < 1000", "valid_data_rate >= 50"]
        );
        assert_eq!(
            names(Preset::Concurrent),
            vec!["success_rate >= 100", "max_latency_ms < 2000"]
        );
        assert_eq!(Preset::HighLoad.policy().checks().len(), 4);
    }
}
