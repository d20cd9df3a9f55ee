//! Periodic and focus-triggered re-fetching of remote-owned state.
//!
//! A poller fetches once immediately, then on every interval tick and on
//! every focus event. Fetches run as independent tasks and may overlap;
//! the last one to resolve wins. A stopped poller starts no further fetch.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::latest::LatestValue;
use super::stop::StopSignal;

const FOCUS_BUFFER: usize = 8;

/// Broadcast of "the client regained focus/visibility".
///
/// The host calls `notify_focus` when the window becomes visible again,
/// for example after the user finished an OAuth flow in a browser.
#[derive(Clone)]
pub struct FocusSignal {
    tx: broadcast::Sender<()>,
}

impl FocusSignal {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(FOCUS_BUFFER);
        Self { tx }
    }

    pub fn notify_focus(&self) {
        let listeners = self.tx.send(()).unwrap_or(0);
        tracing::trace!(listeners, "Focus regained");
    }

    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }

    fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }
}

impl Default for FocusSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Why a fetch was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollTrigger {
    Timer,
    Focus,
}

/// Builder for a reconciliation poller.
pub struct Poller {
    name: &'static str,
    interval: Duration,
    focus: Option<FocusSignal>,
}

impl Poller {
    pub fn new(name: &'static str, interval: Duration) -> Self {
        Self {
            name,
            interval,
            focus: None,
        }
    }

    /// Also fetch whenever `signal` fires.
    pub fn with_focus(mut self, signal: &FocusSignal) -> Self {
        self.focus = Some(signal.clone());
        self
    }

    /// Start polling. The first fetch is issued immediately.
    ///
    /// Failed fetches are logged and retried on the next trigger; they never
    /// clear the last good value.
    pub fn start<T, E, F, Fut>(self, fetch: F) -> PollerHandle<T>
    where
        T: Clone + Send + Sync + 'static,
        E: Display + Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let latest = Arc::new(LatestValue::new());
        let stop = StopSignal::new();
        let focus_rx = self.focus.as_ref().map(FocusSignal::subscribe);

        let driver = PollDriver {
            name: self.name,
            fetch: Arc::new(fetch),
            latest: latest.clone(),
            stop: stop.clone(),
        };
        let task = tokio::spawn(driver.run(self.interval, focus_rx));

        tracing::debug!(poller = self.name, interval_ms = self.interval.as_millis() as u64, "Poller started");

        PollerHandle {
            name: self.name,
            latest,
            stop,
            task: Some(task),
        }
    }
}

struct PollDriver<F, T> {
    name: &'static str,
    fetch: Arc<F>,
    latest: Arc<LatestValue<T>>,
    stop: StopSignal,
}

impl<T, E, F, Fut> PollDriver<F, T>
where
    T: Clone + Send + Sync + 'static,
    E: Display + Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    async fn run(self, interval: Duration, mut focus_rx: Option<broadcast::Receiver<()>>) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.stop.wait() => break,
                _ = ticker.tick() => self.spawn_fetch(PollTrigger::Timer),
                event = recv_focus(&mut focus_rx) => match event {
                    Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {
                        self.spawn_fetch(PollTrigger::Focus);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::debug!(poller = self.name, "Focus source closed");
                        focus_rx = None;
                    }
                },
            }
        }

        tracing::debug!(poller = self.name, "Poller loop exited");
    }

    fn spawn_fetch(&self, trigger: PollTrigger) {
        // Invocation happens under the stop gate.
        let Some(fut) = self.stop.run_unless_stopped(|| (self.fetch)()) else {
            return;
        };

        let name = self.name;
        let latest = self.latest.clone();
        let stop = self.stop.clone();
        tokio::spawn(async move {
            let result = fut.await;
            if stop.is_stopped() {
                tracing::trace!(poller = name, "Discarding fetch result after stop");
                return;
            }
            match result {
                Ok(value) => latest.set(value),
                Err(e) => tracing::warn!(poller = name, trigger = ?trigger, error = %e, "Poll fetch failed"),
            }
        });
    }
}

async fn recv_focus(
    rx: &mut Option<broadcast::Receiver<()>>,
) -> Result<(), broadcast::error::RecvError> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Running poller. Dropping the handle stops it.
pub struct PollerHandle<T> {
    name: &'static str,
    latest: Arc<LatestValue<T>>,
    stop: StopSignal,
    task: Option<JoinHandle<()>>,
}

impl<T: Clone> PollerHandle<T> {
    /// Most recently resolved value.
    pub fn latest(&self) -> Option<T> {
        self.latest.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<T>> {
        self.latest.subscribe()
    }

    /// Resolved values in order, starting with the current one if a fetch
    /// already resolved before this call.
    pub fn updates(&self) -> PollUpdates<T> {
        PollUpdates {
            rx: self.latest.subscribe(),
            primed: false,
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_stopped()
    }

    /// Cancel the timer and detach the focus listener.
    ///
    /// After this returns no new fetch is started, and results of fetches
    /// still in flight are discarded.
    pub fn stop(&mut self) {
        self.stop.stop();
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!(poller = self.name, "Poller stopped");
        }
    }
}

/// Stream of values resolved by a poller. See [`PollerHandle::updates`].
pub struct PollUpdates<T> {
    rx: watch::Receiver<Option<T>>,
    primed: bool,
}

impl<T: Clone> PollUpdates<T> {
    /// Wait for the next resolved value. `None` once the poller is gone.
    pub async fn next(&mut self) -> Option<T> {
        if !self.primed {
            self.primed = true;
            if let Some(value) = self.rx.borrow_and_update().clone() {
                return Some(value);
            }
        }
        loop {
            self.rx.changed().await.ok()?;
            if let Some(value) = self.rx.borrow_and_update().clone() {
                return Some(value);
            }
        }
    }
}

impl<T> Drop for PollerHandle<T> {
    fn drop(&mut self) {
        self.stop.stop();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
