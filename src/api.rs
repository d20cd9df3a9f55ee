//! Typed endpoint catalogue for the giveaway service.
//!
//! Every protected call goes through [`SessionManager::with_reauth`], so a
//! rejected credential is re-acquired at most once per call.

use std::future::Future;

use serde_json::{json, Value};

use crate::domain::{
    AuthorizeUrl, Eligibility, EventUpdate, ExchangeResult, FollowerStats, LiveStreamers,
    Participants, PriceRange, PurchaseStatusResponse, RecentPrizes, StreamerMe, StreamerPrizes,
    StreamerProfile, TrackedStreamers, TradeUrl, ViewerProfile,
};
use crate::error::SyncError;
use crate::session::SessionManager;
use crate::transport::TransportError;

const VIEWER_ME: &str = "/viewer/me";
const VIEWER_TRACKED: &str = "/viewer/tracked";
const TWITCH_AUTHORIZE: &str = "/twitch/authorize-viewer";
const TWITCH_EXCHANGE: &str = "/twitch/exchange-universal";
const STREAMER_ME: &str = "/streamer/me";
const STREAMER_EVENTS: &str = "/streamer/events";
const LIS_TOKEN: &str = "/streamer/lis-skins-token";
const LIS_TRADE_URL: &str = "/streamer/lis-skins-trade-url";
const LIS_TRADE_URL_UNLINK: &str = "/streamer/lis-skins-trade-url/unlink";
const LIS_SETTINGS: &str = "/streamer/lis-skins-settings";
const LIS_REFRESH: &str = "/streamer/lis-skins/refresh";
const LIS_TEST_PURCHASE: &str = "/streamer/lis-skins/test-purchase";
const LIS_PURCHASE_STATUS: &str = "/streamer/lis-skins/purchase-status";
const STREAMER_FOLLOWERS: &str = "/streamer/followers/stats";
const STREAMERS: &str = "/streamers";
const STREAMERS_LIVE: &str = "/streamers/live";
const RECENT_PRIZES: &str = "/public/recent-prizes";

#[derive(Clone)]
pub struct ServiceClient {
    session: SessionManager,
}

impl ServiceClient {
    pub fn new(session: SessionManager) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    async fn protected<T, F, Fut>(&self, op: F) -> Result<T, SyncError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
    {
        self.session.with_reauth(op).await.map_err(SyncError::from)
    }

    // Viewer

    pub async fn viewer_profile(&self) -> Result<ViewerProfile, SyncError> {
        let t = self.session.transport();
        self.protected(move || t.get_json(VIEWER_ME)).await
    }

    pub async fn tracked_streamers(&self) -> Result<TrackedStreamers, SyncError> {
        let t = self.session.transport();
        self.protected(move || t.get_json(VIEWER_TRACKED)).await
    }

    pub async fn track_streamer(&self, twitch_login: &str) -> Result<Value, SyncError> {
        let login = twitch_login.trim().trim_start_matches('@');
        if login.is_empty() {
            return Err(SyncError::InvalidInput("Twitch login must not be empty".to_string()));
        }

        let body = json!({ "twitch_login": login });
        let body = &body;
        let t = self.session.transport();
        self.protected(move || t.post(VIEWER_TRACKED, body)).await
    }

    pub async fn untrack_streamer(&self, streamer_id: i64) -> Result<Value, SyncError> {
        let path = format!("{}/{}", VIEWER_TRACKED, streamer_id);
        let path = path.as_str();
        let t = self.session.transport();
        self.protected(move || t.delete(path)).await
    }

    pub async fn eligibility(&self, streamer_id: i64) -> Result<Eligibility, SyncError> {
        let path = format!("/viewer/eligibility?streamer_id={}", streamer_id);
        let path = path.as_str();
        let t = self.session.transport();
        self.protected(move || t.get_json(path)).await
    }

    // Twitch linking

    /// Request the OAuth redirect URL for linking a Twitch account.
    pub async fn twitch_authorize_url(&self) -> Result<String, SyncError> {
        let t = self.session.transport();
        let response: AuthorizeUrl = self.protected(move || t.get_json(TWITCH_AUTHORIZE)).await?;

        response
            .url
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| {
                SyncError::Network(TransportError::Decode(
                    "No authorize URL received".to_string(),
                ))
            })
    }

    /// Complete an OAuth redirect.
    ///
    /// The redirect may land in a context with no session, so acquiring one
    /// is attempted but not required.
    pub async fn exchange_twitch_code(
        &self,
        code: &str,
        state: &str,
    ) -> Result<ExchangeResult, SyncError> {
        if let Err(e) = self.session.ensure().await {
            tracing::debug!(error = %e, "Exchanging OAuth code without a session");
        }

        let body = json!({ "code": code, "state": state });
        Ok(self
            .session
            .transport()
            .post_json(TWITCH_EXCHANGE, &body)
            .await?)
    }

    // Streamer

    pub async fn streamer_me(&self) -> Result<StreamerMe, SyncError> {
        let t = self.session.transport();
        self.protected(move || t.get_json(STREAMER_ME)).await
    }

    pub async fn set_event(&self, update: &EventUpdate) -> Result<Value, SyncError> {
        if let (Some(min), Some(max)) = (update.price_min, update.price_max) {
            PriceRange::new(min, max).map_err(SyncError::InvalidInput)?;
        }
        let t = self.session.transport();
        self.protected(move || t.post_json(STREAMER_EVENTS, update)).await
    }

    pub async fn set_api_token(&self, api_token: &str) -> Result<Value, SyncError> {
        let api_token = api_token.trim();
        if api_token.is_empty() {
            return Err(SyncError::InvalidInput("API token must not be empty".to_string()));
        }
        let body = json!({ "api_token": api_token });
        let body = &body;
        let t = self.session.transport();
        self.protected(move || t.post(LIS_TOKEN, body)).await
    }

    pub async fn trade_url(&self) -> Result<TradeUrl, SyncError> {
        let t = self.session.transport();
        self.protected(move || t.get_json(LIS_TRADE_URL)).await
    }

    pub async fn set_trade_url(&self, trade_url: &str) -> Result<Value, SyncError> {
        let trade_url = trade_url.trim();
        if trade_url.is_empty() {
            return Err(SyncError::InvalidInput("Trade URL must not be empty".to_string()));
        }
        let body = json!({ "trade_url": trade_url });
        let body = &body;
        let t = self.session.transport();
        self.protected(move || t.post(LIS_TRADE_URL, body)).await
    }

    pub async fn unlink_trade_url(&self) -> Result<Value, SyncError> {
        let body = json!({});
        let body = &body;
        let t = self.session.transport();
        self.protected(move || t.post(LIS_TRADE_URL_UNLINK, body)).await
    }

    pub async fn price_range(&self) -> Result<PriceRange, SyncError> {
        let t = self.session.transport();
        self.protected(move || t.get_json(LIS_SETTINGS)).await
    }

    /// Validated locally; an invalid range never reaches the network.
    pub async fn set_price_range(&self, min: f64, max: f64) -> Result<Value, SyncError> {
        let range = PriceRange::new(min, max).map_err(SyncError::InvalidInput)?;
        let range = &range;
        let t = self.session.transport();
        self.protected(move || t.post_json(LIS_SETTINGS, range)).await
    }

    /// Ask the service to re-check delivery of pending purchases.
    pub async fn refresh_purchases(&self) -> Result<Value, SyncError> {
        let body = json!({});
        let body = &body;
        let t = self.session.transport();
        self.protected(move || t.post(LIS_REFRESH, body)).await
    }

    pub async fn test_purchase(&self, trade_url: &str) -> Result<PurchaseStatusResponse, SyncError> {
        let body = json!({ "trade_url": trade_url.trim() });
        let body = &body;
        let t = self.session.transport();
        self.protected(move || t.post_json(LIS_TEST_PURCHASE, body)).await
    }

    pub async fn purchase_status(
        &self,
        purchase_id: i64,
    ) -> Result<PurchaseStatusResponse, SyncError> {
        let path = format!("{}?purchase_id={}", LIS_PURCHASE_STATUS, purchase_id);
        let path = path.as_str();
        let body = json!({});
        let body = &body;
        let t = self.session.transport();
        self.protected(move || t.post_json(path, body)).await
    }

    pub async fn follower_stats(&self) -> Result<FollowerStats, SyncError> {
        let t = self.session.transport();
        self.protected(move || t.get_json(STREAMER_FOLLOWERS)).await
    }

    // Streamer pages as seen by viewers

    pub async fn streamer_profile(&self, streamer_id: i64) -> Result<StreamerProfile, SyncError> {
        let path = format!("{}/{}", STREAMERS, streamer_id);
        let path = path.as_str();
        let t = self.session.transport();
        self.protected(move || t.get_json(path)).await
    }

    pub async fn streamer_prizes(
        &self,
        streamer_id: i64,
        limit: u32,
        offset: u64,
    ) -> Result<StreamerPrizes, SyncError> {
        let path = format!(
            "{}/{}/prizes?limit={}&offset={}",
            STREAMERS, streamer_id, limit, offset
        );
        let path = path.as_str();
        let t = self.session.transport();
        self.protected(move || t.get_json(path)).await
    }

    pub async fn streamer_participants(&self, streamer_id: i64) -> Result<Participants, SyncError> {
        let path = format!("{}/{}/participants", STREAMERS, streamer_id);
        let path = path.as_str();
        let t = self.session.transport();
        self.protected(move || t.get_json(path)).await
    }

    pub async fn live_streamers(&self) -> Result<LiveStreamers, SyncError> {
        let t = self.session.transport();
        self.protected(move || t.get_json(STREAMERS_LIVE)).await
    }

    // Public

    /// Latest prizes across all streamers. No session required.
    pub async fn recent_prizes(&self, limit: u32) -> Result<RecentPrizes, SyncError> {
        let path = format!("{}?limit={}", RECENT_PRIZES, limit);
        Ok(self.session.transport().get_json(&path).await?)
    }
}
