use serde::Serialize;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::stats::Snapshot;
use crate::thresholds::{Metric, ThresholdExpr, ThresholdOp, parse_threshold_expr};

type ObserveFn = Arc<dyn Fn(&Snapshot) -> f64 + Send + Sync>;
type PredicateFn = Arc<dyn Fn(&Snapshot) -> bool + Send + Sync>;

/// One named pass/fail rule over a [`Snapshot`].
#[derive(Clone)]
pub struct ThresholdCheck {
    name: String,
    message: String,
    observe: ObserveFn,
    predicate: PredicateFn,
}

impl std::fmt::Debug for ThresholdCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThresholdCheck")
            .field("name", &self.name)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

impl ThresholdCheck {
    pub fn new(
        name: impl Into<String>,
        message: impl Into<String>,
        observe: impl Fn(&Snapshot) -> f64 + Send + Sync + 'static,
        predicate: impl Fn(&Snapshot) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            observe: Arc::new(observe),
            predicate: Arc::new(predicate),
        }
    }

    #[must_use]
    pub fn from_expr(expr: ThresholdExpr) -> Self {
        Self::new(
            expr.metric.to_string(),
            expr.to_string(),
            move |s| expr.metric.observe(s),
            move |s| expr.holds(s),
        )
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let expr = parse_threshold_expr(raw).map_err(|error| Error::InvalidThreshold {
            expr: raw.to_string(),
            error,
        })?;
        Ok(Self::from_expr(expr))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn observe(&self, s: &Snapshot) -> f64 {
        (self.observe)(s)
    }

    pub fn passes(&self, s: &Snapshot) -> bool {
        (self.predicate)(s)
    }
}

/// Ordered set of checks; every one is evaluated.
#[derive(Debug, Clone, Default)]
pub struct ThresholdPolicy {
    checks: Vec<ThresholdCheck>,
}

impl ThresholdPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `success_rate >= 95`, `valid_data_rate >= 30`, `avg_latency_ms < 1000`, `throughput > 10`.
    #[must_use]
    pub fn default_policy() -> Self {
        Self::from_exprs([
            ThresholdExpr::new(Metric::SuccessRate, ThresholdOp::Gte, 95.0),
            ThresholdExpr::new(Metric::ValidDataRate, ThresholdOp::Gte, 30.0),
            ThresholdExpr::new(Metric::AvgLatencyMs, ThresholdOp::Lt, 1000.0),
            ThresholdExpr::new(Metric::Throughput, ThresholdOp::Gt, 10.0),
        ])
    }

    #[must_use]
    pub fn from_exprs(exprs: impl IntoIterator<Item = ThresholdExpr>) -> Self {
        Self {
            checks: exprs.into_iter().map(ThresholdCheck::from_expr).collect(),
        }
    }

    pub fn parse<S: AsRef<str>>(raw: impl IntoIterator<Item = S>) -> Result<Self> {
        let checks = raw
            .into_iter()
            .map(|r| ThresholdCheck::parse(r.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { checks })
    }

    #[must_use]
    pub fn with(mut self, check: ThresholdCheck) -> Self {
        self.checks.push(check);
        self
    }

    pub fn checks(&self) -> &[ThresholdCheck] {
        &self.checks
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedCheck {
    pub name: String,
    pub message: String,
    pub actual_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerdictReport {
    pub passed: bool,
    pub failed_checks: Vec<FailedCheck>,
}

/// Evaluates every check of `policy` against `snapshot`.
///
/// Pure: the same inputs always give the same report.
#[must_use]
pub fn validate(snapshot: &Snapshot, policy: &ThresholdPolicy) -> VerdictReport {
    let failed_checks: Vec<FailedCheck> = policy
        .checks
        .iter()
        .filter(|check| !check.passes(snapshot))
        .map(|check| {
            let actual_value = check.observe(snapshot);
            FailedCheck {
                name: check.name.clone(),
                message: format!("{} (actual: {actual_value:.2})", check.message),
                actual_value,
            }
        })
        .collect();

    VerdictReport {
        passed: failed_checks.is_empty(),
        failed_checks,
    }
}
