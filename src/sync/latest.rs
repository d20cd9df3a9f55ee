use parking_lot::Mutex;
use tokio::sync::watch;

/// Cell holding the most recently *resolved* value of a remote read.
///
/// Overlapping fetches write in the order they finish, not the order they
/// started; each write replaces the previous one.
pub struct LatestValue<T> {
    resolutions: Mutex<u64>,
    tx: watch::Sender<Option<T>>,
}

impl<T: Clone> LatestValue<T> {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self {
            resolutions: Mutex::new(0),
            tx,
        }
    }

    pub fn set(&self, value: T) {
        let mut resolutions = self.resolutions.lock();
        *resolutions += 1;
        self.tx.send_replace(Some(value));
    }

    pub fn get(&self) -> Option<T> {
        self.tx.borrow().clone()
    }

    /// Number of values written so far.
    pub fn resolutions(&self) -> u64 {
        *self.resolutions.lock()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<T>> {
        self.tx.subscribe()
    }
}

impl<T: Clone> Default for LatestValue<T> {
    fn default() -> Self {
        Self::new()
    }
}
