//! Home screen: profile, tracked streamers and streamer settings.
//!
//! The three sections fail independently. A viewer who is not a streamer
//! gets a 404 for the streamer section and still sees the rest.

use futures::FutureExt;
use parking_lot::RwLock;

use crate::api::ServiceClient;
use crate::domain::{StreamerMe, TrackedStreamers, ViewerProfile};
use crate::error::SyncError;
use crate::sync::{load_all, Fetcher};

pub const PROFILE: &str = "profile";
pub const TRACKED: &str = "tracked";
pub const STREAMER: &str = "streamer";

enum Section {
    Profile(ViewerProfile),
    Tracked(TrackedStreamers),
    Streamer(StreamerMe),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dashboard {
    pub profile: Option<ViewerProfile>,
    pub tracked: Option<TrackedStreamers>,
    pub streamer: Option<StreamerMe>,
    /// Sections that failed to load on the last refresh.
    pub missing: Vec<&'static str>,
}

impl Dashboard {
    /// Both accounts are linked, so the viewer is entered in giveaways.
    pub fn can_participate(&self) -> bool {
        self.profile
            .as_ref()
            .is_some_and(ViewerProfile::can_participate)
    }

    pub fn is_streamer(&self) -> bool {
        self.streamer
            .as_ref()
            .is_some_and(|me| me.streamer.is_some())
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

pub struct DashboardModel {
    client: ServiceClient,
    cached: RwLock<Option<Dashboard>>,
}

impl DashboardModel {
    pub fn new(client: ServiceClient) -> Self {
        Self {
            client,
            cached: RwLock::new(None),
        }
    }

    pub fn cached(&self) -> Option<Dashboard> {
        self.cached.read().clone()
    }

    /// Load every section concurrently.
    ///
    /// A credential is ensured once up front so the sections do not race
    /// each other to acquire one. When every section fails, the previous
    /// snapshot is kept and returned if there is one.
    pub async fn refresh(&self) -> Result<Dashboard, SyncError> {
        self.client.session().ensure().await?;

        let client = &self.client;
        let fetchers: Vec<Fetcher<'_, Section>> = vec![
            (
                PROFILE,
                async move { client.viewer_profile().await.map(Section::Profile) }.boxed(),
            ),
            (
                TRACKED,
                async move { client.tracked_streamers().await.map(Section::Tracked) }.boxed(),
            ),
            (
                STREAMER,
                async move { client.streamer_me().await.map(Section::Streamer) }.boxed(),
            ),
        ];

        let batch = load_all(fetchers).await;

        let auth_failure = batch.failures().find_map(|(_, e)| e.auth_error());
        if let Some(err) = auth_failure {
            return Err(err);
        }

        let has_cached = self.cached.read().is_some();
        let batch = batch.into_result(has_cached)?;
        if batch.all_failed() {
            tracing::warn!("Dashboard refresh failed entirely, keeping previous snapshot");
            if let Some(cached) = self.cached() {
                return Ok(cached);
            }
        }

        let mut batch = batch;
        let mut dashboard = Dashboard {
            missing: batch.failures().map(|(name, _)| *name).collect(),
            ..Dashboard::default()
        };
        if let Some(Section::Profile(profile)) = batch.take(PROFILE) {
            dashboard.profile = Some(profile);
        }
        if let Some(Section::Tracked(tracked)) = batch.take(TRACKED) {
            dashboard.tracked = Some(tracked);
        }
        if let Some(Section::Streamer(streamer)) = batch.take(STREAMER) {
            dashboard.streamer = Some(streamer);
        }

        tracing::debug!(missing = ?dashboard.missing, "Dashboard refreshed");
        *self.cached.write() = Some(dashboard.clone());
        Ok(dashboard)
    }
}
