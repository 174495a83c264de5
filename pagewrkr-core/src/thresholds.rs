use crate::stats::Snapshot;

/// A snapshot value a threshold expression can refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Metric {
    SuccessRate,
    ValidDataRate,
    EmptyDataRate,
    FailureCount,
    TotalRequests,
    AvgLatencyMs,
    MinLatencyMs,
    MaxLatencyMs,
    P50LatencyMs,
    P90LatencyMs,
    P95LatencyMs,
    P99LatencyMs,
    Throughput,
}

impl Metric {
    #[must_use]
    pub fn observe(self, s: &Snapshot) -> f64 {
        match self {
            Self::SuccessRate => s.success_rate,
            Self::ValidDataRate => s.valid_data_rate,
            Self::EmptyDataRate => s.empty_data_rate,
            Self::FailureCount => s.failure_count as f64,
            Self::TotalRequests => s.total_requests as f64,
            Self::AvgLatencyMs => s.average_latency_ms,
            Self::MinLatencyMs => s.min_latency_ms as f64,
            Self::MaxLatencyMs => s.max_latency_ms as f64,
            Self::P50LatencyMs => s.p50_latency_ms as f64,
            Self::P90LatencyMs => s.p90_latency_ms as f64,
            Self::P95LatencyMs => s.p95_latency_ms as f64,
            Self::P99LatencyMs => s.p99_latency_ms as f64,
            Self::Throughput => s.throughput_per_second,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdOp {
    Lt,
    Lte,
    Gt,
    Gte,
    Eq,
}

impl ThresholdOp {
    #[must_use]
    pub fn compare(self, observed: f64, limit: f64) -> bool {
        match self {
            Self::Lt => observed < limit,
            Self::Lte => observed <= limit,
            Self::Gt => observed > limit,
            Self::Gte => observed >= limit,
            Self::Eq => (observed - limit).abs() < f64::EPSILON,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Eq => "==",
        }
    }
}

impl std::fmt::Display for ThresholdOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdExpr {
    pub metric: Metric,
    pub op: ThresholdOp,
    pub value: f64,
}

impl ThresholdExpr {
    #[must_use]
    pub fn new(metric: Metric, op: ThresholdOp, value: f64) -> Self {
        Self { metric, op, value }
    }

    #[must_use]
    pub fn holds(&self, s: &Snapshot) -> bool {
        self.op.compare(self.metric.observe(s), self.value)
    }
}

impl std::fmt::Display for ThresholdExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.metric, self.op, self.value)
    }
}

/// Parses `"<metric> <op> <value>"`, e.g. `"success_rate >= 95"`. Whitespace is ignored.
pub fn parse_threshold_expr(raw: &str) -> Result<ThresholdExpr, String> {
    let s: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if s.is_empty() {
        return Err("empty threshold".to_string());
    }

    let ops = [
        ("<=", ThresholdOp::Lte),
        (">=", ThresholdOp::Gte),
        ("==", ThresholdOp::Eq),
        ("<", ThresholdOp::Lt),
        (">", ThresholdOp::Gt),
    ];
    let (op_pos, op_len, op) = ops
        .iter()
        .find_map(|(tok, op)| s.find(tok).map(|pos| (pos, tok.len(), *op)))
        .ok_or_else(|| format!("invalid threshold (missing operator): {raw}"))?;

    let (left, right_with_op) = s.split_at(op_pos);
    let right = &right_with_op[op_len..];
    if left.is_empty() || right.is_empty() {
        return Err(format!("invalid threshold: {raw}"));
    }

    let metric: Metric = left
        .to_ascii_lowercase()
        .parse()
        .map_err(|_| format!("unknown metric `{left}` in threshold: {raw}"))?;

    let value: f64 = right
        .parse()
        .map_err(|_| format!("invalid numeric value in threshold: {raw}"))?;
    if !value.is_finite() {
        return Err(format!("invalid numeric value in threshold: {raw}"));
    }

    Ok(ThresholdExpr { metric, op, value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_threshold_expr_trims_whitespace() {
        let expr =
            parse_threshold_expr("  avg_latency_ms  <=  123  ").unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(expr.metric, Metric::AvgLatencyMs);
        assert_eq!(expr.op, ThresholdOp::Lte);
        assert_eq!(expr.value, 123.0);
    }

    #[test]
    fn parse_threshold_expr_prefers_two_char_operators() {
        let expr = parse_threshold_expr("success_rate>=95").unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(expr.op, ThresholdOp::Gte);
        let expr = parse_threshold_expr("throughput>10").unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(expr.op, ThresholdOp::Gt);
        assert_eq!(expr.metric, Metric::Throughput);
    }

    #[test]
    fn parse_threshold_expr_rejects_garbage() {
        for raw in [
            "",
            "success_rate",
            "nope < 1",
            "success_rate >= lots",
            "<5",
            "p99_latency_ms<",
        ] {
            assert!(parse_threshold_expr(raw).is_err(), "{raw:?} should not parse");
        }
        let err = match parse_threshold_expr("latency < 1") {
            Ok(_) => panic!("expected error"),
            Err(e) => e,
        };
        assert!(err.contains("unknown metric"));
    }

    #[test]
    fn display_round_trips_through_the_parser() {
        let expr = ThresholdExpr::new(Metric::P95LatencyMs, ThresholdOp::Lt, 250.0);
        assert_eq!(expr.to_string(), "p95_latency_ms < 250");
        assert_eq!(parse_threshold_expr(&expr.to_string()).ok(), Some(expr));
    }

    #[test]
    fn ops_compare() {
        assert!(ThresholdOp::Lt.compare(1.0, 2.0));
        assert!(!ThresholdOp::Lt.compare(2.0, 2.0));
        assert!(ThresholdOp::Lte.compare(2.0, 2.0));
        assert!(ThresholdOp::Gte.compare(100.0, 100.0));
        assert!(ThresholdOp::Eq.compare(0.0, 0.0));
        assert!(!ThresholdOp::Gt.compare(10.0, 10.0));
    }
}
