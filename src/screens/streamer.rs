//! A streamer's public page: profile, live status, prizes and participants.
//!
//! The page stays fresh through a poller. Whether the viewer tracks the
//! streamer is a [`ManagedResource`], so track and untrack show at once and
//! a poll that lands mid-write does not flip the button back.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use parking_lot::RwLock;

use crate::api::ServiceClient;
use crate::domain::{Eligibility, Participants, StreamerPrizes, StreamerProfile, TrackedStreamers};
use crate::error::SyncError;
use crate::sync::{load_all, Fetcher, FocusSignal, ManagedResource, OptimisticExecutor, Poller, PollerHandle};

pub const PROFILE: &str = "profile";
pub const TRACKED: &str = "tracked";

pub const PRIZES_PAGE_SIZE: u32 = 15;

enum Section {
    Profile(StreamerProfile),
    Tracked(TrackedStreamers),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamerPage {
    pub profile: StreamerProfile,
    pub tracked: bool,
}

#[derive(Clone)]
pub struct StreamerPageModel {
    client: ServiceClient,
    streamer_id: i64,
    tracked: ManagedResource<bool>,
    profile: Arc<RwLock<Option<StreamerProfile>>>,
    focus: FocusSignal,
}

impl StreamerPageModel {
    pub fn new(client: ServiceClient, streamer_id: i64) -> Self {
        Self {
            client,
            streamer_id,
            tracked: ManagedResource::new(false),
            profile: Arc::new(RwLock::new(None)),
            focus: FocusSignal::new(),
        }
    }

    pub fn streamer_id(&self) -> i64 {
        self.streamer_id
    }

    pub fn tracked(&self) -> &ManagedResource<bool> {
        &self.tracked
    }

    pub fn focus(&self) -> &FocusSignal {
        &self.focus
    }

    pub fn profile(&self) -> Option<StreamerProfile> {
        self.profile.read().clone()
    }

    /// Load the profile and the viewer's tracked list concurrently.
    ///
    /// The profile is required. A failed tracked list leaves the tracked
    /// flag as it was.
    pub async fn load(&self) -> Result<StreamerPage, SyncError> {
        let client = &self.client;
        let streamer_id = self.streamer_id;
        let fetchers: Vec<Fetcher<'_, Section>> = vec![
            (
                PROFILE,
                async move {
                    client
                        .streamer_profile(streamer_id)
                        .await
                        .map(Section::Profile)
                }
                .boxed(),
            ),
            (
                TRACKED,
                async move { client.tracked_streamers().await.map(Section::Tracked) }.boxed(),
            ),
        ];

        let mut batch = load_all(fetchers).await;
        if let Some(err) = batch.failures().find_map(|(_, e)| e.auth_error()) {
            return Err(err);
        }

        let profile = match batch.remove(PROFILE) {
            Some(Ok(Section::Profile(profile))) => profile,
            Some(Err(e)) => return Err(e),
            _ => return Err(SyncError::AggregateFailed { failed: 1 }),
        };
        if let Some(Section::Tracked(tracked)) = batch.take(TRACKED) {
            self.tracked.replace_committed(tracked.contains(self.streamer_id));
        }

        *self.profile.write() = Some(profile.clone());
        Ok(StreamerPage {
            profile,
            tracked: self.tracked.visible(),
        })
    }

    /// Reload the page on `interval` and whenever focus returns.
    pub fn watch(&self, interval: Duration) -> PollerHandle<StreamerPage> {
        let model = self.clone();
        Poller::new("streamer-page", interval)
            .with_focus(&self.focus)
            .start(move || {
                let model = model.clone();
                async move { model.load().await }
            })
    }

    /// Keep the participant list fresh.
    pub fn watch_participants(&self, interval: Duration) -> PollerHandle<Participants> {
        let client = self.client.clone();
        let streamer_id = self.streamer_id;
        Poller::new("streamer-participants", interval).start(move || {
            let client = client.clone();
            async move { client.streamer_participants(streamer_id).await }
        })
    }

    /// Track the streamer. Needs a loaded profile for the Twitch login.
    pub async fn track(&self) -> Result<(), SyncError> {
        let login = self
            .profile()
            .and_then(|p| p.streamer.twitch_login)
            .filter(|login| !login.trim().is_empty())
            .ok_or_else(|| {
                SyncError::InvalidInput("Streamer has no Twitch login to track".to_string())
            })?;

        let result =
            OptimisticExecutor::mutate(&self.tracked, true, self.client.track_streamer(&login)).await;
        if let Err(e) = &result {
            tracing::warn!(streamer_id = self.streamer_id, error = %e, "Track failed, reverted");
        }
        result.map(|_| ())
    }

    pub async fn untrack(&self) -> Result<(), SyncError> {
        let result = OptimisticExecutor::mutate(
            &self.tracked,
            false,
            self.client.untrack_streamer(self.streamer_id),
        )
        .await;
        if let Err(e) = &result {
            tracing::warn!(streamer_id = self.streamer_id, error = %e, "Untrack failed, reverted");
        }
        result.map(|_| ())
    }

    pub async fn eligibility(&self) -> Result<Eligibility, SyncError> {
        self.client.eligibility(self.streamer_id).await
    }

    /// One page of prizes, zero-based.
    pub async fn prizes_page(&self, page: u32) -> Result<StreamerPrizes, SyncError> {
        let offset = page as u64 * PRIZES_PAGE_SIZE as u64;
        self.client
            .streamer_prizes(self.streamer_id, PRIZES_PAGE_SIZE, offset)
            .await
    }
}
