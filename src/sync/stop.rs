use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

/// One-way stop flag shared between a background task and its owner.
///
/// `run_unless_stopped` and `stop` serialize on the same gate, so once
/// `stop` returns no gated closure can begin.
#[derive(Clone, Default)]
pub struct StopSignal {
    stopped: Arc<AtomicBool>,
    gate: Arc<Mutex<()>>,
    notify: Arc<Notify>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        let _gate = self.gate.lock();
        if !self.stopped.swap(true, Ordering::SeqCst) {
            self.notify.notify_waiters();
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Run `f` only if `stop` has not been called.
    pub fn run_unless_stopped<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
        let _gate = self.gate.lock();
        if self.is_stopped() {
            return None;
        }
        Some(f())
    }

    pub async fn wait(&self) {
        // Subscribe before checking the flag; otherwise a stop() landing
        // between the check and the await would be lost.
        let notified = self.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if self.is_stopped() {
            return;
        }
        notified.await;
    }
}
