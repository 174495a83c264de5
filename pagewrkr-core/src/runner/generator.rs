use futures::FutureExt as _;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;

use crate::error::{Error, Result};
use crate::executor::RequestExecutor;
use crate::outcome::{RequestOutcome, RequestSpec, TransportErrorKind};
use crate::stats::{Snapshot, StatsAggregator};

use super::load::{Jitter, LoadConfig};
use super::progress::{ProgressFn, ProgressUpdate};
use super::signal::{StartSignal, StopSignal};

/// Runs `workers` concurrent workers, each issuing `requests_per_worker` sequential requests.
pub struct LoadGenerator {
    config: LoadConfig,
    stop: Arc<StopSignal>,
    progress: Option<ProgressFn>,
}

impl std::fmt::Debug for LoadGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadGenerator")
            .field("config", &self.config)
            .field("stopped", &self.stop.is_stopped())
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl LoadGenerator {
    /// Validates `config`; nothing is spawned until [`run`](Self::run).
    pub fn new(config: LoadConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            stop: Arc::new(StopSignal::new()),
            progress: None,
        })
    }

    #[must_use]
    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    #[must_use]
    pub fn with_stop_signal(mut self, stop: Arc<StopSignal>) -> Self {
        self.stop = stop;
        self
    }

    pub fn stop_signal(&self) -> Arc<StopSignal> {
        self.stop.clone()
    }

    /// Runs every worker to completion and returns the sealed [`Snapshot`].
    ///
    /// `spec_factory` receives 0-based `(worker_index, request_index)`.
    pub async fn run<E, F>(&self, executor: Arc<E>, spec_factory: F) -> Result<Snapshot>
    where
        E: RequestExecutor,
        F: Fn(u64, u64) -> RequestSpec + Send + Sync + 'static,
    {
        let stats = Arc::new(StatsAggregator::new(self.config.classification));
        let spec_factory: Arc<F> = Arc::new(spec_factory);
        let start_signal = Arc::new(StartSignal::default());
        let run_started: Arc<OnceLock<Instant>> = Arc::new(OnceLock::new());

        let mut workers = JoinSet::new();
        for index in 0..self.config.workers {
            let worker = Worker {
                index,
                requests: self.config.requests_per_worker,
                jitter: self.config.jitter,
                run_timeout: self.config.run_timeout,
                executor: executor.clone(),
                spec_factory: spec_factory.clone(),
                stats: stats.clone(),
                start_signal: start_signal.clone(),
                stop: self.stop.clone(),
                run_started: run_started.clone(),
            };
            workers.spawn(worker.run());
        }

        let started = Instant::now();
        let _ = run_started.set(started);
        start_signal.start();
        tracing::debug!(
            workers = self.config.workers,
            requests_per_worker = self.config.requests_per_worker,
            "workers released"
        );

        let progress_handle = self
            .progress
            .clone()
            .map(|progress| self.spawn_progress(progress, stats.clone(), started));

        // Join every worker even if one fails, so none outlives the run.
        let mut join_error = None;
        while let Some(res) = workers.join_next().await {
            if let Err(err) = res {
                tracing::warn!(error = %err, "worker task failed");
                join_error.get_or_insert(err);
            }
        }
        let elapsed = started.elapsed();

        if let Some(h) = progress_handle {
            h.abort();
            let _ = h.await;
        }

        if let Some(err) = join_error {
            return Err(Error::Join(err));
        }

        let snapshot = stats.snapshot(elapsed);

        let expected = self.config.planned_requests();
        let recorded = snapshot
            .total_requests
            .saturating_add(snapshot.skipped_requests);
        if recorded != expected {
            return Err(Error::LostOutcomes { expected, recorded });
        }

        tracing::info!(
            total = snapshot.total_requests,
            success = snapshot.success_count,
            failure = snapshot.failure_count,
            skipped = snapshot.skipped_requests,
            elapsed_ms = elapsed.as_millis() as u64,
            "run finished"
        );

        Ok(snapshot)
    }

    fn spawn_progress(
        &self,
        progress: ProgressFn,
        stats: Arc<StatsAggregator>,
        started: Instant,
    ) -> tokio::task::JoinHandle<()> {
        let every = self.config.progress_interval;
        let planned_requests = self.config.planned_requests();

        tokio::spawn(async move {
            let Some(first) = tokio::time::Instant::now().checked_add(every) else {
                return;
            };
            let mut interval = tokio::time::interval_at(first, every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            let mut tick: u64 = 0;
            let mut last_at = started;
            let mut last_total = 0u64;

            loop {
                interval.tick().await;

                tick = tick.saturating_add(1);
                let now = Instant::now();
                let dt = now.duration_since(last_at);
                last_at = now;

                let live = stats.live();
                let delta = live.requests_total.saturating_sub(last_total);
                last_total = live.requests_total;

                (progress)(ProgressUpdate {
                    tick,
                    elapsed: started.elapsed(),
                    interval: dt,
                    requests_total: live.requests_total,
                    failed_requests_total: live.failure_count,
                    skipped_requests_total: live.skipped_requests,
                    rps_now: (delta as f64) / dt.as_secs_f64().max(1e-9),
                    planned_requests,
                });
            }
        })
    }
}

struct Worker<E, F> {
    index: u64,
    requests: u64,
    jitter: Option<Jitter>,
    run_timeout: Option<Duration>,
    executor: Arc<E>,
    spec_factory: Arc<F>,
    stats: Arc<StatsAggregator>,
    start_signal: Arc<StartSignal>,
    stop: Arc<StopSignal>,
    run_started: Arc<OnceLock<Instant>>,
}

impl<E, F> Worker<E, F>
where
    E: RequestExecutor,
    F: Fn(u64, u64) -> RequestSpec + Send + Sync + 'static,
{
    async fn run(self) {
        self.start_signal.wait().await;

        let deadline = match (self.run_timeout, self.run_started.get()) {
            // A deadline past the end of the clock never fires.
            (Some(timeout), Some(started)) => started.checked_add(timeout),
            _ => None,
        };

        for request in 0..self.requests {
            if self.stop.is_stopped() || deadline.is_some_and(|d| Instant::now() >= d) {
                let skipped = self.requests - request;
                self.stats.record_skipped(skipped);
                tracing::debug!(worker = self.index, skipped, "worker gave up before finishing");
                return;
            }

            let outcome = self.issue(request, deadline).await;
            self.stats.record(&outcome);

            if request + 1 < self.requests
                && let Some(jitter) = self.jitter
            {
                self.pause(jitter.sample(), deadline).await;
            }
        }

        tracing::debug!(worker = self.index, requests = self.requests, "worker done");
    }

    /// Produces exactly one terminal outcome for request `request` of this worker.
    async fn issue(&self, request: u64, deadline: Option<Instant>) -> RequestOutcome {
        let started = Instant::now();

        let spec = match std::panic::catch_unwind(AssertUnwindSafe(|| {
            (self.spec_factory)(self.index, request)
        })) {
            Ok(spec) => spec,
            Err(_) => {
                tracing::warn!(worker = self.index, request, "request spec factory panicked");
                return RequestOutcome::panicked(started.elapsed());
            }
        };

        let exec = AssertUnwindSafe(self.executor.execute(spec)).catch_unwind();

        tokio::select! {
            res = exec => res.unwrap_or_else(|_| {
                tracing::warn!(worker = self.index, request, "request executor panicked");
                RequestOutcome::panicked(started.elapsed())
            }),
            () = until(deadline) => {
                RequestOutcome::transport(TransportErrorKind::Timeout, started.elapsed())
            }
            () = self.stop.stopped() => {
                RequestOutcome::transport(TransportErrorKind::Cancelled, started.elapsed())
            }
        }
    }

    /// Sleeps for `delay` unless the run deadline passes or the run is stopped first.
    async fn pause(&self, delay: Duration, deadline: Option<Instant>) {
        tokio::select! {
            () = tokio::time::sleep(delay) => {}
            () = until(deadline) => {}
            () = self.stop.stopped() => {}
        }
    }
}

async fn until(deadline: Option<Instant>) {
    match deadline {
        Some(d) => tokio::time::sleep_until(tokio::time::Instant::from_std(d)).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct Fixed(RequestOutcome);

    impl RequestExecutor for Fixed {
        async fn execute(&self, _spec: RequestSpec) -> RequestOutcome {
            self.0.clone()
        }
    }

    /// Records the spec sequence each worker produced.
    #[derive(Default)]
    struct Recording {
        seen: Mutex<Vec<RequestSpec>>,
        in_flight: AtomicU64,
        max_in_flight: AtomicU64,
    }

    impl RequestExecutor for Recording {
        async fn execute(&self, spec: RequestSpec) -> RequestOutcome {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(2)).await;
            self.seen
                .lock()
                .unwrap_or_else(|p| p.into_inner())
                .push(spec);
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            RequestOutcome::ok(1, Duration::from_millis(2))
        }
    }

    fn config(workers: u64, requests_per_worker: u64) -> LoadConfig {
        LoadConfig {
            workers,
            requests_per_worker,
            ..LoadConfig::default()
        }
    }

    #[test]
    fn new_rejects_zero_workers() {
        assert!(matches!(
            LoadGenerator::new(config(0, 1)),
            Err(Error::InvalidWorkers)
        ));
    }

    #[test]
    fn new_rejects_a_run_timeout_past_the_clock() {
        let cfg = LoadConfig {
            run_timeout: Some(Duration::from_secs(u64::MAX)),
            ..config(2, 2)
        };
        assert!(matches!(LoadGenerator::new(cfg), Err(Error::InvalidRunTimeout)));
    }

    #[tokio::test]
    async fn a_huge_run_timeout_runs_to_completion() {
        let exec = Arc::new(Fixed(RequestOutcome::ok(1, Duration::from_millis(1))));
        let cfg = LoadConfig {
            run_timeout: Some(Duration::from_secs(100 * 365 * 24 * 3600)),
            ..config(2, 2)
        };
        let generator = LoadGenerator::new(cfg).unwrap_or_else(|e| panic!("{e}"));
        let s = generator
            .run(exec, |w, _| RequestSpec::new(w + 1, 1))
            .await
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(s.total_requests, 4);
        assert_eq!(s.skipped_requests, 0);
    }

    #[tokio::test]
    async fn issues_exactly_workers_times_requests() {
        let exec = Arc::new(Fixed(RequestOutcome::ok(1, Duration::from_millis(1))));
        for (w, r) in [(1, 1), (3, 7), (16, 4)] {
            let generator = LoadGenerator::new(config(w, r)).unwrap_or_else(|e| panic!("{e}"));
            let s = generator
                .run(exec.clone(), |w, _| RequestSpec::new(w + 1, 1))
                .await
                .unwrap_or_else(|e| panic!("{e}"));
            assert_eq!(s.total_requests, w * r);
            assert_eq!(s.skipped_requests, 0);
        }
    }

    #[tokio::test]
    async fn a_single_worker_never_overlaps_itself() {
        let exec = Arc::new(Recording::default());
        let generator = LoadGenerator::new(config(1, 5)).unwrap_or_else(|e| panic!("{e}"));
        generator
            .run(exec.clone(), |_, r| RequestSpec::new(r + 1, 1))
            .await
            .unwrap_or_else(|e| panic!("{e}"));

        assert_eq!(exec.max_in_flight.load(Ordering::SeqCst), 1);
        let pages: Vec<u64> = exec
            .seen
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .iter()
            .map(|s| s.page)
            .collect();
        assert_eq!(pages, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn stop_before_run_skips_everything() {
        let exec = Arc::new(Fixed(RequestOutcome::ok(1, Duration::ZERO)));
        let generator = LoadGenerator::new(config(4, 3)).unwrap_or_else(|e| panic!("{e}"));
        generator.stop_signal().stop();

        let s = generator
            .run(exec, |w, _| RequestSpec::new(w + 1, 1))
            .await
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(s.total_requests, 0);
        assert_eq!(s.skipped_requests, 12);
    }
}
