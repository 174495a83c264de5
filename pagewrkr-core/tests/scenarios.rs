use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use pagewrkr_core::runner::{LoadConfig, LoadGenerator};
use pagewrkr_core::{
    Metric, Payload, RequestExecutor, RequestOutcome, RequestSpec, Snapshot, ThresholdExpr,
    ThresholdOp, ThresholdPolicy, TransportErrorKind, inspect, validate,
};
use rand::Rng as _;

/// Answers every request with the same JSON body and status 200.
struct Body(&'static str);

impl RequestExecutor for Body {
    async fn execute(&self, _spec: RequestSpec) -> RequestOutcome {
        RequestOutcome::listing(Duration::from_millis(1), inspect(self.0.as_bytes()))
    }
}

struct TimesOut;

impl RequestExecutor for TimesOut {
    async fn execute(&self, _spec: RequestSpec) -> RequestOutcome {
        RequestOutcome::transport(TransportErrorKind::Timeout, Duration::from_millis(3))
    }
}

/// Every tenth request fails with a 500, the rest return one valid item.
#[derive(Default)]
struct EveryTenthFails(AtomicU64);

impl RequestExecutor for EveryTenthFails {
    async fn execute(&self, _spec: RequestSpec) -> RequestOutcome {
        let n = self.0.fetch_add(1, Ordering::Relaxed) + 1;
        if n % 10 == 0 {
            RequestOutcome::http_status(500, Duration::from_millis(1))
        } else {
            RequestOutcome::ok(1, Duration::from_millis(1))
        }
    }
}

struct RandomLatency;

impl RequestExecutor for RandomLatency {
    async fn execute(&self, _spec: RequestSpec) -> RequestOutcome {
        let ms = rand::thread_rng().gen_range(1..=50);
        let latency = Duration::from_millis(ms);
        tokio::time::sleep(latency).await;
        RequestOutcome::ok(1, latency)
    }
}

async fn run<E: RequestExecutor>(
    executor: E,
    workers: u64,
    requests_per_worker: u64,
) -> Snapshot {
    let generator = LoadGenerator::new(LoadConfig {
        workers,
        requests_per_worker,
        ..LoadConfig::default()
    })
    .unwrap_or_else(|e| panic!("{e}"));

    generator
        .run(Arc::new(executor), |w, _| RequestSpec::new(w + 1, 1))
        .await
        .unwrap_or_else(|e| panic!("{e}"))
}

fn assert_counts_consistent(s: &Snapshot) {
    assert_eq!(s.success_count + s.failure_count, s.total_requests);
    assert_eq!(s.valid_data_count + s.empty_data_count, s.success_count);
    if s.total_requests > 0 {
        assert!(s.min_latency_ms as f64 <= s.average_latency_ms);
        assert!(s.average_latency_ms <= s.max_latency_ms as f64);
    }
}

#[tokio::test]
async fn one_valid_item_counts_as_valid_data() {
    let s = run(
        Body(r#"{"items":[{"id":1,"name":"a","price":1.0}]}"#),
        1,
        1,
    )
    .await;
    assert_eq!(s.total_requests, 1);
    assert_eq!(s.success_count, 1);
    assert_eq!(s.valid_data_count, 1);
    assert_eq!(s.failure_count, 0);
    assert_counts_consistent(&s);
}

#[tokio::test]
async fn empty_items_count_as_empty_data() {
    let s = run(Body(r#"{"items":[]}"#), 1, 1).await;
    assert_eq!(s.success_count, 1);
    assert_eq!(s.empty_data_count, 1);
    assert_eq!(s.valid_data_count, 0);
    assert_counts_consistent(&s);
}

#[tokio::test]
async fn transport_timeout_is_a_failure() {
    let s = run(TimesOut, 1, 1).await;
    assert_eq!(s.total_requests, 1);
    assert_eq!(s.failure_count, 1);
    assert_eq!(s.success_count, 0);
    assert_eq!(s.timeouts, 1);
    assert_counts_consistent(&s);
}

#[tokio::test]
async fn ninety_percent_success_fails_a_95_percent_policy() {
    let s = run(EveryTenthFails::default(), 20, 5).await;
    assert_eq!(s.total_requests, 100);
    assert_eq!(s.success_rate, 90.0);
    assert_eq!(s.valid_data_rate, 90.0);
    assert_counts_consistent(&s);

    let policy = ThresholdPolicy::from_exprs([ThresholdExpr::new(
        Metric::SuccessRate,
        ThresholdOp::Gte,
        95.0,
    )]);
    let verdict = validate(&s, &policy);
    assert!(!verdict.passed);
    assert_eq!(verdict.failed_checks.len(), 1);
    assert_eq!(verdict.failed_checks[0].name, "success_rate");
    assert_eq!(verdict.failed_checks[0].actual_value, 90.0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn random_latencies_stay_within_observed_range() {
    let s = run(RandomLatency, 20, 5).await;
    assert_eq!(s.total_requests, 100);
    assert!(s.max_latency_ms >= s.min_latency_ms);
    assert!(s.min_latency_ms >= 1 && s.max_latency_ms <= 50);
    assert!(s.throughput_per_second > 0.0);
    assert!(s.p50_latency_ms <= s.p99_latency_ms);
    assert_counts_consistent(&s);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn totals_match_workers_times_requests() {
    for (workers, requests) in [(1, 1), (1, 10), (5, 2), (20, 5), (64, 3)] {
        let s = run(Body(r#"{"items":[]}"#), workers, requests).await;
        assert_eq!(s.total_requests, workers * requests, "{workers}x{requests}");
        assert_eq!(s.skipped_requests, 0);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn classification_does_not_depend_on_worker_count() {
    let body = r#"{"items":[{"id":1,"name":"a","price":1.0},{"id":"x","name":"b","price":2}]}"#;
    let single = run(Body(body), 1, 12).await;
    let many = run(Body(body), 12, 1).await;

    for s in [&single, &many] {
        assert_eq!(s.total_requests, 12);
        assert_eq!(s.success_count, 12);
        assert_eq!(s.empty_data_count, 12);
        assert_eq!(s.schema_errors, 12);
    }
}

#[test]
fn payload_shapes_are_classified_as_data() {
    let Payload { item_count, schema } = inspect(br#"{"items":[{"id":1,"name":"a","price":1}]}"#);
    assert_eq!(item_count, Some(1));
    assert!(schema.is_ok());

    let Payload { item_count, schema } = inspect(br#"{"data":[]}"#);
    assert_eq!(item_count, None);
    assert!(schema.is_err());
}
