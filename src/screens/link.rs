//! Twitch account linking flow.
//!
//! The authorize URL is handed to a [`LinkOpener`]; the OAuth redirect then
//! completes somewhere this process cannot see. Completion is discovered by
//! polling the viewer profile on an interval and whenever focus returns.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::api::ServiceClient;
use crate::domain::{ExchangeResult, LinkIntent, LinkReducer, LinkState, ViewerProfile};
use crate::error::SyncError;
use crate::mvi::Reducer;
use crate::sync::{FocusSignal, Poller};

/// Opens a URL in an external context (a browser, the host app).
#[async_trait]
pub trait LinkOpener: Send + Sync {
    async fn open(&self, url: &str) -> Result<(), String>;
}

/// Records opened URLs without opening anything.
#[derive(Default)]
pub struct RecordingOpener {
    opened: parking_lot::Mutex<Vec<String>>,
}

impl RecordingOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().clone()
    }
}

#[async_trait]
impl LinkOpener for RecordingOpener {
    async fn open(&self, url: &str) -> Result<(), String> {
        self.opened.lock().push(url.to_string());
        Ok(())
    }
}

pub struct LinkFlow {
    client: ServiceClient,
    opener: Arc<dyn LinkOpener>,
    focus: FocusSignal,
    interval: Duration,
    state: watch::Sender<LinkState>,
}

impl LinkFlow {
    pub fn new(client: ServiceClient, opener: Arc<dyn LinkOpener>, interval: Duration) -> Self {
        let (state, _) = watch::channel(LinkState::default());
        Self {
            client,
            opener,
            focus: FocusSignal::new(),
            interval,
            state,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LinkState> {
        self.state.subscribe()
    }

    /// Signal the host raises when the app becomes visible again.
    pub fn focus(&self) -> &FocusSignal {
        &self.focus
    }

    fn dispatch(&self, intent: LinkIntent) -> LinkState {
        let mut next = LinkState::default();
        self.state.send_modify(|state| {
            let previous = std::mem::take(state);
            *state = LinkReducer::reduce(previous, intent);
            next = state.clone();
        });
        next
    }

    fn observe(&self, profile: &ViewerProfile) -> LinkState {
        self.dispatch(LinkIntent::ProfileObserved {
            linked: profile.twitch_linked,
            login: profile.twitch_login.clone(),
        })
    }

    /// Fetch the profile once and fold it into the link state.
    pub async fn sync_profile(&self) -> Result<LinkState, SyncError> {
        let profile = self.client.viewer_profile().await?;
        Ok(self.observe(&profile))
    }

    /// Request an authorize URL and hand it to the opener.
    ///
    /// Fails the attempt when no URL can be obtained. A failing opener only
    /// logs: the user can still open the URL by hand.
    pub async fn begin(&self) -> Result<LinkState, SyncError> {
        let state = self.dispatch(LinkIntent::Start);
        if state != LinkState::Authorizing {
            return Ok(state);
        }

        let url = match self.client.twitch_authorize_url().await {
            Ok(url) => url,
            Err(e) => {
                self.dispatch(LinkIntent::RequestFailed {
                    message: e.to_string(),
                });
                return Err(e);
            }
        };

        let state = self.dispatch(LinkIntent::UrlReceived { url: url.clone() });
        if let Err(e) = self.opener.open(&url).await {
            tracing::warn!(error = %e, "Failed to open authorize URL");
        }
        tracing::info!("Waiting for Twitch authorization to complete");
        Ok(state)
    }

    /// Run the whole flow: begin, then poll the profile until the account
    /// shows as linked or `timeout` elapses.
    ///
    /// Returns the final state; a timeout leaves it pending.
    pub async fn run(&self, timeout: Duration) -> Result<LinkState, SyncError> {
        let state = self.begin().await?;
        if !state.is_waiting() {
            return Ok(state);
        }

        let client = self.client.clone();
        let mut poller = Poller::new("twitch-link", self.interval)
            .with_focus(&self.focus)
            .start(move || {
                let client = client.clone();
                async move { client.viewer_profile().await }
            });
        let mut updates = poller.updates();

        let waited = tokio::time::timeout(timeout, async {
            while let Some(profile) = updates.next().await {
                if self.observe(&profile).is_linked() {
                    break;
                }
            }
        })
        .await;

        poller.stop();
        if waited.is_err() {
            tracing::info!("Linking not confirmed before timeout");
        }
        Ok(self.state())
    }

    /// Complete the OAuth redirect in this process, then confirm it against
    /// the profile.
    pub async fn complete_callback(
        &self,
        code: &str,
        oauth_state: &str,
    ) -> Result<ExchangeResult, SyncError> {
        let result = self.client.exchange_twitch_code(code, oauth_state).await?;
        if let Err(e) = self.sync_profile().await {
            tracing::debug!(error = %e, "Profile refresh after exchange failed");
        }
        Ok(result)
    }
}
