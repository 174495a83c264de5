use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    pub tick: u64,
    pub elapsed: Duration,
    pub interval: Duration,
    pub requests_total: u64,
    pub failed_requests_total: u64,
    pub skipped_requests_total: u64,
    /// Requests completed per second since the previous tick.
    pub rps_now: f64,
    /// Requests the run will issue at most.
    pub planned_requests: u64,
}

pub type ProgressFn = Arc<dyn Fn(ProgressUpdate) + Send + Sync + 'static>;
