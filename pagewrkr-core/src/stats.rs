use hdrhistogram::Histogram;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::outcome::{ErrorKind, RequestOutcome};

/// Decides which successful responses count as "valid data" rather than "empty data".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DataClassification {
    /// Minimum `items` length for a page to count as valid.
    pub min_items: usize,
    /// Whether every item must match the listing schema.
    pub require_valid_schema: bool,
}

impl Default for DataClassification {
    fn default() -> Self {
        Self {
            min_items: 1,
            require_valid_schema: true,
        }
    }
}

impl DataClassification {
    #[must_use]
    pub fn is_valid(&self, outcome: &RequestOutcome) -> bool {
        let enough_items = outcome
            .item_count
            .is_some_and(|count| count >= self.min_items);
        enough_items && (outcome.has_valid_schema || !self.require_valid_schema)
    }
}

/// Counters visible while a run is still in flight.
///
/// Fields are loaded independently, so they may be skewed relative to each other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LiveTotals {
    pub requests_total: u64,
    pub failure_count: u64,
    pub skipped_requests: u64,
}

/// Immutable aggregate of every outcome recorded up to a join barrier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub total_requests: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub empty_data_count: u64,
    pub valid_data_count: u64,
    /// Requests that were never issued because the run deadline passed or the run was stopped.
    pub skipped_requests: u64,

    /// `failure_count == transport_errors + status_errors + panics`.
    pub transport_errors: u64,
    pub status_errors: u64,
    /// Requests whose spec factory or executor panicked.
    pub panics: u64,
    pub schema_errors: u64,
    pub timeouts: u64,

    pub sum_latency_ms: u64,
    pub min_latency_ms: u64,
    pub max_latency_ms: u64,
    pub average_latency_ms: f64,
    pub p50_latency_ms: u64,
    pub p90_latency_ms: u64,
    pub p95_latency_ms: u64,
    pub p99_latency_ms: u64,

    /// Percentages in `[0, 100]`.
    pub success_rate: f64,
    pub valid_data_rate: f64,
    pub empty_data_rate: f64,

    pub duration_secs: f64,
    pub throughput_per_second: f64,
}

/// Thread-safe accumulator of [`RequestOutcome`]s.
///
/// Counters are plain atomics; only the latency histogram sits behind a short lock.
#[derive(Debug)]
pub struct StatsAggregator {
    classification: DataClassification,

    total_requests: AtomicU64,
    success_count: AtomicU64,
    failure_count: AtomicU64,
    empty_data_count: AtomicU64,
    valid_data_count: AtomicU64,
    skipped_requests: AtomicU64,

    transport_errors: AtomicU64,
    status_errors: AtomicU64,
    panics: AtomicU64,
    schema_errors: AtomicU64,
    timeouts: AtomicU64,

    sum_latency_ms: AtomicU64,
    min_latency_ms: AtomicU64,
    max_latency_ms: AtomicU64,
    latency_ms: Mutex<Histogram<u64>>,
}

impl Default for StatsAggregator {
    fn default() -> Self {
        Self::new(DataClassification::default())
    }
}

impl StatsAggregator {
    #[must_use]
    pub fn new(classification: DataClassification) -> Self {
        // Track up to 1h in milliseconds (with 3 sigfigs); larger samples saturate.
        let hist = Histogram::<u64>::new_with_bounds(1, 3_600_000, 3)
            .unwrap_or_else(|err| panic!("failed to init histogram: {err}"));

        Self {
            classification,
            total_requests: AtomicU64::new(0),
            success_count: AtomicU64::new(0),
            failure_count: AtomicU64::new(0),
            empty_data_count: AtomicU64::new(0),
            valid_data_count: AtomicU64::new(0),
            skipped_requests: AtomicU64::new(0),
            transport_errors: AtomicU64::new(0),
            status_errors: AtomicU64::new(0),
            panics: AtomicU64::new(0),
            schema_errors: AtomicU64::new(0),
            timeouts: AtomicU64::new(0),
            sum_latency_ms: AtomicU64::new(0),
            min_latency_ms: AtomicU64::new(u64::MAX),
            max_latency_ms: AtomicU64::new(0),
            latency_ms: Mutex::new(hist),
        }
    }

    pub fn record(&self, outcome: &RequestOutcome) {
        let latency = outcome.latency_ms;
        self.sum_latency_ms.fetch_add(latency, Ordering::Relaxed);
        self.min_latency_ms.fetch_min(latency, Ordering::Relaxed);
        self.max_latency_ms.fetch_max(latency, Ordering::Relaxed);
        self.latency_ms
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .saturating_record(latency);

        match &outcome.error {
            Some(ErrorKind::Transport(_)) => {
                self.transport_errors.fetch_add(1, Ordering::Relaxed);
            }
            Some(ErrorKind::Panicked) => {
                self.panics.fetch_add(1, Ordering::Relaxed);
            }
            Some(ErrorKind::HttpStatus(_)) => {
                self.status_errors.fetch_add(1, Ordering::Relaxed);
            }
            Some(ErrorKind::Schema(_)) => {
                self.schema_errors.fetch_add(1, Ordering::Relaxed);
            }
            None => {}
        }
        if outcome.is_timeout() {
            self.timeouts.fetch_add(1, Ordering::Relaxed);
        }

        if outcome.status_code == Some(200) {
            self.success_count.fetch_add(1, Ordering::Relaxed);
            if self.classification.is_valid(outcome) {
                self.valid_data_count.fetch_add(1, Ordering::Relaxed);
            } else {
                self.empty_data_count.fetch_add(1, Ordering::Relaxed);
            }
        } else {
            self.failure_count.fetch_add(1, Ordering::Relaxed);
        }

        // Bumped last so a live reader never sees more requests than classified outcomes.
        self.total_requests.fetch_add(1, Ordering::Release);
    }

    /// Counts requests a worker gave up on without issuing them.
    pub fn record_skipped(&self, n: u64) {
        self.skipped_requests.fetch_add(n, Ordering::Relaxed);
    }

    pub fn live(&self) -> LiveTotals {
        LiveTotals {
            requests_total: self.total_requests.load(Ordering::Acquire),
            failure_count: self.failure_count.load(Ordering::Relaxed),
            skipped_requests: self.skipped_requests.load(Ordering::Relaxed),
        }
    }

    /// Builds a [`Snapshot`] for a run that lasted `duration`.
    ///
    /// Exact once every writer has finished. While writers are in flight individual fields may
    /// be skewed relative to each other.
    pub fn snapshot(&self, duration: Duration) -> Snapshot {
        let total_requests = self.total_requests.load(Ordering::Acquire);
        let success_count = self.success_count.load(Ordering::Relaxed);
        let valid_data_count = self.valid_data_count.load(Ordering::Relaxed);
        let empty_data_count = self.empty_data_count.load(Ordering::Relaxed);
        let sum_latency_ms = self.sum_latency_ms.load(Ordering::Relaxed);

        let min_latency_ms = match self.min_latency_ms.load(Ordering::Relaxed) {
            u64::MAX => 0,
            v => v,
        };

        let (p50, p90, p95, p99) = {
            let h = self
                .latency_ms
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            #[allow(clippy::len_zero)]
            if h.len() == 0 {
                (0, 0, 0, 0)
            } else {
                (
                    h.value_at_quantile(0.50),
                    h.value_at_quantile(0.90),
                    h.value_at_quantile(0.95),
                    h.value_at_quantile(0.99),
                )
            }
        };

        let pct = |part: u64| {
            if total_requests == 0 {
                0.0
            } else {
                (part as f64) / (total_requests as f64) * 100.0
            }
        };

        let average_latency_ms = if total_requests == 0 {
            0.0
        } else {
            (sum_latency_ms as f64) / (total_requests as f64)
        };

        let duration_secs = duration.as_secs_f64();
        let throughput_per_second = if duration_secs > 0.0 {
            (total_requests as f64) / duration_secs
        } else {
            0.0
        };

        Snapshot {
            total_requests,
            success_count,
            failure_count: self.failure_count.load(Ordering::Relaxed),
            empty_data_count,
            valid_data_count,
            skipped_requests: self.skipped_requests.load(Ordering::Relaxed),
            transport_errors: self.transport_errors.load(Ordering::Relaxed),
            status_errors: self.status_errors.load(Ordering::Relaxed),
            panics: self.panics.load(Ordering::Relaxed),
            schema_errors: self.schema_errors.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            sum_latency_ms,
            min_latency_ms,
            max_latency_ms: self.max_latency_ms.load(Ordering::Relaxed),
            average_latency_ms,
            p50_latency_ms: p50,
            p90_latency_ms: p90,
            p95_latency_ms: p95,
            p99_latency_ms: p99,
            success_rate: pct(success_count),
            valid_data_rate: pct(valid_data_count),
            empty_data_rate: pct(empty_data_count),
            duration_secs,
            throughput_per_second,
        }
    }
}
