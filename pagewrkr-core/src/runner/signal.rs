use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

/// One-shot flag that async waiters can block on.
#[derive(Debug, Default)]
struct Latch {
    set: AtomicBool,
    notify: Notify,
}

impl Latch {
    fn set(&self) {
        self.set.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }

    fn is_set(&self) -> bool {
        self.set.load(Ordering::Acquire)
    }

    async fn wait(&self) {
        loop {
            // Register interest before checking the flag so a concurrent `set` can't be missed.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.is_set() {
                return;
            }
            notified.await;
        }
    }
}

/// Releases all workers at once so spawn skew stays out of the measured window.
#[derive(Debug, Default)]
pub(super) struct StartSignal(Latch);

impl StartSignal {
    pub(super) fn start(&self) {
        self.0.set();
    }

    pub(super) async fn wait(&self) {
        self.0.wait().await;
    }
}

/// Cooperative stop request for a running [`LoadGenerator`](super::LoadGenerator).
///
/// Workers stop issuing new requests, in-flight requests resolve as cancelled and jitter
/// sleeps are cut short.
#[derive(Debug, Default)]
pub struct StopSignal(Latch);

impl StopSignal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.set();
    }

    pub fn is_stopped(&self) -> bool {
        self.0.is_set()
    }

    pub async fn stopped(&self) {
        self.0.wait().await;
    }
}
