//! Optimistic updates with generation-guarded rollback.
//!
//! A resource shows its optimistic value while a remote write is in flight.
//! Each mutation takes a generation stamp; a failed mutation only rolls
//! back if its stamp is still the newest one for that resource, so a slow
//! failure can never revert a later edit. Rolling back the newest edit
//! reveals the next older unsettled edit, if any, before `committed`.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;

struct ResourceState<T> {
    committed: T,
    /// Generation of the mutation that last advanced `committed`.
    committed_generation: u64,
    /// Unsettled mutations, oldest first. The newest one is visible.
    in_flight: Vec<(u64, T)>,
    generation: u64,
}

impl<T: Clone> ResourceState<T> {
    fn visible(&self) -> T {
        match self.in_flight.last() {
            Some((_, value)) => value.clone(),
            None => self.committed.clone(),
        }
    }

    fn is_newest(&self, generation: u64) -> bool {
        self.in_flight.last().is_some_and(|(g, _)| *g == generation)
    }

    fn remove(&mut self, generation: u64) {
        self.in_flight.retain(|(g, _)| *g != generation);
    }
}

/// A remote-owned, user-editable value.
#[derive(Clone)]
pub struct ManagedResource<T> {
    state: Arc<Mutex<ResourceState<T>>>,
    tx: Arc<watch::Sender<T>>,
}

impl<T: Clone + Send + Sync + 'static> ManagedResource<T> {
    pub fn new(committed: T) -> Self {
        let (tx, _) = watch::channel(committed.clone());
        Self {
            state: Arc::new(Mutex::new(ResourceState {
                committed,
                committed_generation: 0,
                in_flight: Vec::new(),
                generation: 0,
            })),
            tx: Arc::new(tx),
        }
    }

    /// What the user should currently see.
    pub fn visible(&self) -> T {
        self.state.lock().visible()
    }

    /// Last value confirmed by the service.
    pub fn committed(&self) -> T {
        self.state.lock().committed.clone()
    }

    /// At least one mutation has not settled yet.
    pub fn is_pending(&self) -> bool {
        !self.state.lock().in_flight.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    /// Receive every change of the visible value.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }

    /// Adopt a value re-fetched from the service.
    ///
    /// Ignored while a mutation is pending: the mutation's own settlement
    /// decides the value, and the next reconciliation catches up.
    /// Returns whether the value was applied.
    pub fn replace_committed(&self, value: T) -> bool {
        let mut state = self.state.lock();
        if !state.in_flight.is_empty() {
            return false;
        }
        state.committed = value;
        self.publish(&state);
        true
    }

    fn begin(&self, value: T) -> u64 {
        let mut state = self.state.lock();
        state.generation += 1;
        let generation = state.generation;
        state.in_flight.push((generation, value));
        self.publish(&state);
        generation
    }

    fn settle_success(&self, generation: u64, value: T) {
        let mut state = self.state.lock();
        if generation >= state.committed_generation {
            state.committed = value;
            state.committed_generation = generation;
        }
        state.remove(generation);
        self.publish(&state);
    }

    /// Returns whether the visible value was rolled back.
    ///
    /// Only the newest mutation is visible, so only its failure changes what
    /// the user sees: the previous unsettled value if an older mutation is
    /// still in flight, otherwise `committed`.
    fn settle_failure(&self, generation: u64) -> bool {
        let mut state = self.state.lock();
        let was_newest = state.is_newest(generation);
        state.remove(generation);
        if was_newest {
            self.publish(&state);
        }
        was_newest
    }

    fn publish(&self, state: &ResourceState<T>) {
        self.tx.send_replace(state.visible());
    }
}

/// Applies local changes first and commits them remotely second.
pub struct OptimisticExecutor;

impl OptimisticExecutor {
    /// Show `value` immediately, then await `commit`.
    ///
    /// On success `value` becomes the committed value. On failure the
    /// resource reverts to its pre-mutation value unless a newer mutation
    /// for the same resource has started since, and the error is returned.
    pub async fn mutate<T, R, E, Fut>(
        resource: &ManagedResource<T>,
        value: T,
        commit: Fut,
    ) -> Result<R, E>
    where
        T: Clone + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>>,
        E: std::fmt::Display,
    {
        let generation = resource.begin(value.clone());

        match commit.await {
            Ok(response) => {
                resource.settle_success(generation, value);
                Ok(response)
            }
            Err(e) => {
                let rolled_back = resource.settle_failure(generation);
                tracing::debug!(
                    generation,
                    rolled_back,
                    error = %e,
                    "Optimistic mutation failed"
                );
                Err(e)
            }
        }
    }
}

/// Keyed collection of resources, e.g. event flags by event key.
pub struct ResourceSet<K, T> {
    entries: RwLock<BTreeMap<K, ManagedResource<T>>>,
}

impl<K, T> ResourceSet<K, T>
where
    K: Ord + Clone,
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn get(&self, key: &K) -> Option<ManagedResource<T>> {
        self.entries.read().get(key).cloned()
    }

    /// Reconcile with a fresh server listing.
    ///
    /// Existing keys adopt the new value (unless a mutation is pending),
    /// new keys are inserted, and keys missing from the listing are removed
    /// unless they have a mutation in flight.
    pub fn reconcile(&self, fresh: impl IntoIterator<Item = (K, T)>) {
        let fresh: BTreeMap<K, T> = fresh.into_iter().collect();
        let mut entries = self.entries.write();

        entries.retain(|key, resource| fresh.contains_key(key) || resource.is_pending());

        for (key, value) in fresh {
            match entries.get(&key) {
                Some(resource) => {
                    resource.replace_committed(value);
                }
                None => {
                    entries.insert(key, ManagedResource::new(value));
                }
            }
        }
    }

    /// Resources in key order.
    pub fn entries(&self) -> Vec<(K, ManagedResource<T>)> {
        self.entries
            .read()
            .iter()
            .map(|(key, resource)| (key.clone(), resource.clone()))
            .collect()
    }

    /// Visible values in key order.
    pub fn snapshot(&self) -> Vec<(K, T)> {
        self.entries
            .read()
            .iter()
            .map(|(key, resource)| (key.clone(), resource.visible()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl<K, T> Default for ResourceSet<K, T>
where
    K: Ord + Clone,
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn success_commits_value() {
        let resource = ManagedResource::new(false);
        let result: Result<(), String> =
            OptimisticExecutor::mutate(&resource, true, async { Ok(()) }).await;

        assert!(result.is_ok());
        assert!(resource.visible());
        assert!(resource.committed());
        assert!(!resource.is_pending());
    }

    #[tokio::test]
    async fn failure_restores_previous_value() {
        let resource = ManagedResource::new(false);
        let result: Result<(), String> =
            OptimisticExecutor::mutate(&resource, true, async { Err("boom".to_string()) }).await;

        assert_eq!(result.unwrap_err(), "boom");
        assert!(!resource.visible());
        assert!(!resource.committed());
    }

    #[tokio::test]
    async fn optimistic_value_is_visible_while_pending() {
        let resource = ManagedResource::new(1u32);
        let (tx, rx) = oneshot::channel::<Result<(), String>>();

        let task = {
            let resource = resource.clone();
            tokio::spawn(async move {
                OptimisticExecutor::mutate(&resource, 2, async { rx.await.unwrap() }).await
            })
        };
        tokio::task::yield_now().await;
        while !resource.is_pending() {
            tokio::task::yield_now().await;
        }
        assert_eq!(resource.visible(), 2);
        assert_eq!(resource.committed(), 1);

        tx.send(Ok(())).unwrap();
        task.await.unwrap().unwrap();
        assert_eq!(resource.visible(), 2);
    }

    #[tokio::test]
    async fn stale_failure_does_not_revert_newer_mutation() {
        let resource = ManagedResource::new("a");
        let (first_tx, first_rx) = oneshot::channel::<Result<(), String>>();
        let (second_tx, second_rx) = oneshot::channel::<Result<(), String>>();

        let first = OptimisticExecutor::mutate(&resource, "b", async { first_rx.await.unwrap() });
        let second = OptimisticExecutor::mutate(&resource, "c", async { second_rx.await.unwrap() });
        tokio::pin!(first);
        tokio::pin!(second);

        // Start both mutations so both optimistic values have been applied.
        assert!(futures::poll!(first.as_mut()).is_pending());
        assert!(futures::poll!(second.as_mut()).is_pending());
        assert_eq!(resource.visible(), "c");

        first_tx.send(Err("slow failure".to_string())).unwrap();
        assert!(first.await.is_err());
        assert_eq!(resource.visible(), "c");
        assert!(resource.is_pending());

        second_tx.send(Ok(())).unwrap();
        second.await.unwrap();
        assert_eq!(resource.visible(), "c");
        assert_eq!(resource.committed(), "c");
    }

    #[tokio::test]
    async fn newer_failure_restores_older_pending_value() {
        let resource = ManagedResource::new("a");
        let (first_tx, first_rx) = oneshot::channel::<Result<(), String>>();

        let first = OptimisticExecutor::mutate(&resource, "b", async { first_rx.await.unwrap() });
        tokio::pin!(first);
        assert!(futures::poll!(first.as_mut()).is_pending());
        assert_eq!(resource.visible(), "b");

        let second: Result<(), String> =
            OptimisticExecutor::mutate(&resource, "c", async { Err("rejected".to_string()) }).await;
        assert!(second.is_err());

        // The first write is still outstanding, so "b" stays visible and
        // a server listing must not overwrite it.
        assert_eq!(resource.visible(), "b");
        assert!(resource.is_pending());
        assert!(!resource.replace_committed("server-stale"));
        assert_eq!(resource.visible(), "b");

        first_tx.send(Ok(())).unwrap();
        first.await.unwrap();
        assert_eq!(resource.visible(), "b");
        assert_eq!(resource.committed(), "b");
        assert!(!resource.is_pending());
    }

    #[tokio::test]
    async fn both_failing_returns_to_committed() {
        let resource = ManagedResource::new(0);
        let (first_tx, first_rx) = oneshot::channel::<Result<(), String>>();

        let first = OptimisticExecutor::mutate(&resource, 1, async { first_rx.await.unwrap() });
        tokio::pin!(first);
        assert!(futures::poll!(first.as_mut()).is_pending());

        let second: Result<(), String> =
            OptimisticExecutor::mutate(&resource, 2, async { Err("no".to_string()) }).await;
        assert!(second.is_err());
        assert_eq!(resource.visible(), 1);

        first_tx.send(Err("no".to_string())).unwrap();
        assert!(first.await.is_err());
        assert_eq!(resource.visible(), 0);
        assert!(!resource.is_pending());
    }

    #[tokio::test]
    async fn older_success_after_newer_success_keeps_newer_value() {
        let resource = ManagedResource::new(0);
        let (first_tx, first_rx) = oneshot::channel::<Result<(), String>>();

        let first = OptimisticExecutor::mutate(&resource, 1, async { first_rx.await.unwrap() });
        tokio::pin!(first);
        assert!(futures::poll!(first.as_mut()).is_pending());

        let second: Result<(), String> = OptimisticExecutor::mutate(&resource, 2, async { Ok(()) }).await;
        assert!(second.is_ok());

        first_tx.send(Ok(())).unwrap();
        first.await.unwrap();
        assert_eq!(resource.committed(), 2);
        assert_eq!(resource.visible(), 2);
    }

    #[test]
    fn reconciliation_skipped_while_pending() {
        let resource = ManagedResource::new(10);
        resource.begin(20);
        assert!(!resource.replace_committed(30));
        assert_eq!(resource.visible(), 20);

        assert!(resource.settle_failure(1));
        assert!(resource.replace_committed(30));
        assert_eq!(resource.visible(), 30);
    }

    #[tokio::test]
    async fn subscribers_observe_optimistic_then_rollback() {
        let resource = ManagedResource::new(false);
        let rx = resource.subscribe();

        let _: Result<(), String> =
            OptimisticExecutor::mutate(&resource, true, async { Err("nope".to_string()) }).await;

        assert!(!*rx.borrow());
    }

    #[test]
    fn resource_set_skips_entries_with_any_write_outstanding() {
        let set: ResourceSet<String, &str> = ResourceSet::new();
        set.reconcile(vec![("k".to_string(), "a")]);
        let resource = set.get(&"k".to_string()).unwrap();

        resource.begin("b");
        let newer = resource.begin("c");
        assert!(resource.settle_failure(newer));
        assert!(resource.is_pending());

        set.reconcile(vec![("k".to_string(), "server-stale")]);
        assert_eq!(set.snapshot(), vec![("k".to_string(), "b")]);
    }

    #[test]
    fn resource_set_reconcile_keeps_pending_entries() {
        let set: ResourceSet<String, bool> = ResourceSet::new();
        set.reconcile(vec![("a".to_string(), true), ("b".to_string(), false)]);
        assert_eq!(set.len(), 2);

        set.get(&"b".to_string()).unwrap().begin(true);
        set.reconcile(vec![("a".to_string(), false)]);

        assert_eq!(
            set.snapshot(),
            vec![("a".to_string(), false), ("b".to_string(), true)]
        );
    }
}
