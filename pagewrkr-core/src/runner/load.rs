use rand::Rng as _;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::stats::DataClassification;

/// Uniform random pause inserted between a worker's successive requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Jitter {
    pub min: Duration,
    pub max: Duration,
}

impl Jitter {
    #[must_use]
    pub fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    /// A pause of exactly `d`.
    #[must_use]
    pub fn fixed(d: Duration) -> Self {
        Self { min: d, max: d }
    }

    #[must_use]
    pub fn sample(&self) -> Duration {
        if self.min >= self.max {
            return self.min;
        }
        let lo = u64::try_from(self.min.as_nanos()).unwrap_or(u64::MAX);
        let hi = u64::try_from(self.max.as_nanos()).unwrap_or(u64::MAX);
        Duration::from_nanos(rand::thread_rng().gen_range(lo..=hi))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadConfig {
    pub workers: u64,
    pub requests_per_worker: u64,
    pub jitter: Option<Jitter>,
    /// Deadline for the whole run, measured from the moment workers are released.
    pub run_timeout: Option<Duration>,
    pub progress_interval: Duration,
    pub classification: DataClassification,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            requests_per_worker: 1,
            jitter: None,
            run_timeout: None,
            progress_interval: Duration::from_secs(1),
            classification: DataClassification::default(),
        }
    }
}

impl LoadConfig {
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::InvalidWorkers);
        }
        if self.requests_per_worker == 0 {
            return Err(Error::InvalidRequestsPerWorker);
        }
        if let Some(jitter) = self.jitter
            && jitter.min > jitter.max
        {
            return Err(Error::InvalidJitter);
        }
        if self
            .run_timeout
            .is_some_and(|d| d.is_zero() || !fits_clock(d))
        {
            return Err(Error::InvalidRunTimeout);
        }
        if self.progress_interval.is_zero() || !fits_clock(self.progress_interval) {
            return Err(Error::InvalidProgressInterval);
        }
        Ok(())
    }

    /// `workers * requests_per_worker`.
    #[must_use]
    pub fn planned_requests(&self) -> u64 {
        self.workers.saturating_mul(self.requests_per_worker)
    }
}

/// Whether `d` can be added to the current instant without overflowing the clock.
fn fits_clock(d: Duration) -> bool {
    Instant::now().checked_add(d).is_some()
}
