//! Skin purchase delivery tracking.
//!
//! Delivery is performed asynchronously by a third party, so the client
//! polls the purchase status until it reaches a terminal state. Streamers
//! additionally keep a background refresh running that asks the service to
//! re-check all pending purchases.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::watch;

use crate::api::ServiceClient;
use crate::domain::{PurchaseIntent, PurchaseReducer, PurchaseState, PurchaseStatusResponse};
use crate::error::SyncError;
use crate::mvi::Reducer;
use crate::sync::{Poller, PollerHandle};

/// One poll of the status endpoint. Failures are values here so the
/// tracker can record them without ending the watch.
type StatusPoll = Result<PurchaseStatusResponse, Arc<SyncError>>;

pub struct PurchaseTracker {
    client: ServiceClient,
    interval: Duration,
    state: watch::Sender<PurchaseState>,
}

impl PurchaseTracker {
    pub fn new(client: ServiceClient, purchase_id: i64, interval: Duration) -> Self {
        let (state, _) = watch::channel(PurchaseState::for_purchase(purchase_id));
        Self {
            client,
            interval,
            state,
        }
    }

    pub fn state(&self) -> PurchaseState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PurchaseState> {
        self.state.subscribe()
    }

    fn purchase_id(&self) -> Result<i64, SyncError> {
        self.state
            .borrow()
            .purchase_id
            .ok_or_else(|| SyncError::InvalidInput("Purchase id is unknown".to_string()))
    }

    fn dispatch(&self, intent: PurchaseIntent) -> PurchaseState {
        let mut next = PurchaseState::default();
        self.state.send_modify(|state| {
            let previous = std::mem::take(state);
            *state = PurchaseReducer::reduce(previous, intent);
            next = state.clone();
        });
        next
    }

    /// Fetch the status once.
    pub async fn check(&self) -> Result<PurchaseState, SyncError> {
        let purchase_id = self.purchase_id()?;
        match self.client.purchase_status(purchase_id).await {
            Ok(response) => Ok(self.dispatch(PurchaseIntent::Observed(response))),
            Err(e) => {
                self.dispatch(PurchaseIntent::PollFailed {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Poll until the purchase settles or `timeout` elapses.
    ///
    /// Transient poll failures are recorded and polling continues. An
    /// authentication failure ends the watch with that error.
    pub async fn watch(&self, timeout: Duration) -> Result<PurchaseState, SyncError> {
        let purchase_id = self.purchase_id()?;
        if self.state().is_settled() {
            return Ok(self.state());
        }

        let client = self.client.clone();
        let mut poller = Poller::new("purchase-status", self.interval).start(move || {
            let client = client.clone();
            async move {
                let poll: StatusPoll = client.purchase_status(purchase_id).await.map_err(Arc::new);
                Ok::<_, Infallible>(poll)
            }
        });
        let mut updates = poller.updates();

        let waited = tokio::time::timeout(timeout, async {
            while let Some(poll) = updates.next().await {
                match poll {
                    Ok(response) => {
                        let state = self.dispatch(PurchaseIntent::Observed(response));
                        if state.is_settled() {
                            return Ok(());
                        }
                    }
                    Err(e) => {
                        if let Some(auth) = e.auth_error() {
                            return Err(auth);
                        }
                        tracing::debug!(purchase_id, error = %e, "Purchase status poll failed");
                        self.dispatch(PurchaseIntent::PollFailed {
                            message: e.to_string(),
                        });
                    }
                }
            }
            Ok(())
        })
        .await;

        poller.stop();
        match waited {
            Ok(Err(e)) => Err(e),
            Ok(Ok(())) => Ok(self.state()),
            Err(_) => {
                tracing::info!(purchase_id, "Purchase not settled before timeout");
                Ok(self.state())
            }
        }
    }
}

/// Keep asking the service to re-check pending purchases.
///
/// Failures are logged by the poller and otherwise ignored. Dropping or
/// stopping the handle ends the refresh.
pub fn start_background_refresh(client: ServiceClient, interval: Duration) -> PollerHandle<Value> {
    Poller::new("purchase-refresh", interval).start(move || {
        let client = client.clone();
        async move { client.refresh_purchases().await }
    })
}
