//! Wire types for the giveaway service.
//!
//! Fields the service may omit are defaulted so a partially populated
//! response still decodes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::purchase::PurchaseStatus;

/// `GET /viewer/me`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewerProfile {
    #[serde(default)]
    pub twitch_linked: bool,
    #[serde(default)]
    pub twitch_login: Option<String>,
    #[serde(default)]
    pub steam_trade_url: Option<String>,
}

impl ViewerProfile {
    pub fn steam_linked(&self) -> bool {
        self.steam_trade_url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty())
    }

    /// Both accounts are linked, so the viewer can enter giveaways.
    pub fn can_participate(&self) -> bool {
        self.twitch_linked && self.steam_linked()
    }
}

/// `GET /twitch/authorize-viewer`
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizeUrl {
    #[serde(default)]
    pub url: Option<String>,
}

/// `POST /twitch/exchange-universal`
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeResult {
    #[serde(rename = "type", default)]
    pub account_type: Option<String>,
}

impl ExchangeResult {
    pub fn is_streamer(&self) -> bool {
        self.account_type.as_deref() == Some("streamer")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedStreamer {
    pub id: i64,
    #[serde(default)]
    pub twitch_login: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// `GET /viewer/tracked`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrackedStreamers {
    #[serde(default)]
    pub streamers: Vec<TrackedStreamer>,
}

impl TrackedStreamers {
    pub fn contains(&self, streamer_id: i64) -> bool {
        self.streamers.iter().any(|s| s.id == streamer_id)
    }
}

/// `GET /viewer/eligibility?streamer_id=`
#[derive(Debug, Clone, Deserialize)]
pub struct Eligibility {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StreamerInfo {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub lis_skins_token_set: bool,
}

/// A giveaway trigger configured by a streamer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRow {
    pub event_key: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub price_min: Option<f64>,
    #[serde(default)]
    pub price_max: Option<f64>,
    #[serde(default)]
    pub winners_count: Option<u32>,
    #[serde(default)]
    pub trigger_value: Option<f64>,
}

impl EventRow {
    pub fn config(&self) -> EventConfig {
        EventConfig {
            price_min: self.price_min,
            price_max: self.price_max,
            winners_count: self.winners_count,
            trigger_value: self.trigger_value,
        }
    }
}

/// Prize and trigger settings of one event.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EventConfig {
    #[serde(default)]
    pub price_min: Option<f64>,
    #[serde(default)]
    pub price_max: Option<f64>,
    #[serde(default)]
    pub winners_count: Option<u32>,
    #[serde(default)]
    pub trigger_value: Option<f64>,
}

impl EventConfig {
    pub fn validate(&self) -> Result<(), String> {
        validate_prize_fields(self.price_min, self.price_max, self.winners_count)?;
        if self.trigger_value.is_some_and(|v| !v.is_finite() || v < 0.0) {
            return Err("Trigger value must not be negative.".to_string());
        }
        Ok(())
    }
}

/// Values applied to every event at once. Unset fields keep each event's
/// own value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BulkEventSettings {
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub winners_count: Option<u32>,
}

impl BulkEventSettings {
    pub fn is_empty(&self) -> bool {
        self.price_min.is_none() && self.price_max.is_none() && self.winners_count.is_none()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.is_empty() {
            return Err("Enter values to apply.".to_string());
        }
        validate_prize_fields(self.price_min, self.price_max, self.winners_count)
    }

    pub fn merge_into(&self, config: EventConfig) -> EventConfig {
        EventConfig {
            price_min: self.price_min.or(config.price_min),
            price_max: self.price_max.or(config.price_max),
            winners_count: self.winners_count.or(config.winners_count),
            trigger_value: config.trigger_value,
        }
    }
}

fn validate_prize_fields(
    price_min: Option<f64>,
    price_max: Option<f64>,
    winners_count: Option<u32>,
) -> Result<(), String> {
    for price in [price_min, price_max].into_iter().flatten() {
        if !price.is_finite() || price < 0.0 {
            return Err("Prices must be non-negative numbers.".to_string());
        }
    }
    if let (Some(min), Some(max)) = (price_min, price_max) {
        PriceRange::new(min, max)?;
    }
    if winners_count == Some(0) {
        return Err("At least one winner is required.".to_string());
    }
    Ok(())
}

/// `GET /streamer/me`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StreamerMe {
    #[serde(default)]
    pub streamer: Option<StreamerInfo>,
    #[serde(default)]
    pub events: Vec<EventRow>,
}

/// `POST /streamer/events`. Absent fields are left unchanged by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EventUpdate {
    pub event_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winners_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger_value: Option<f64>,
}

impl EventUpdate {
    pub fn toggle(event_key: impl Into<String>, enabled: bool) -> Self {
        Self {
            event_key: event_key.into(),
            enabled: Some(enabled),
            ..Self::default()
        }
    }

    pub fn config(event_key: impl Into<String>, config: &EventConfig) -> Self {
        Self {
            event_key: event_key.into(),
            enabled: None,
            price_min: config.price_min,
            price_max: config.price_max,
            winners_count: config.winners_count,
            trigger_value: config.trigger_value,
        }
    }

    /// Only the fields set in `settings` are sent.
    pub fn bulk(event_key: impl Into<String>, settings: &BulkEventSettings) -> Self {
        Self {
            event_key: event_key.into(),
            price_min: settings.price_min,
            price_max: settings.price_max,
            winners_count: settings.winners_count,
            ..Self::default()
        }
    }
}

/// `GET/POST /streamer/lis-skins-trade-url`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TradeUrl {
    #[serde(default)]
    pub trade_url: Option<String>,
}

/// `GET/POST /streamer/lis-skins-settings`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PriceRange {
    #[serde(default)]
    pub price_min: Option<f64>,
    #[serde(default)]
    pub price_max: Option<f64>,
}

impl PriceRange {
    /// Validate a range before it is sent.
    pub fn new(min: f64, max: f64) -> Result<Self, String> {
        if !min.is_finite() || !max.is_finite() {
            return Err("Enter a valid price range.".to_string());
        }
        if min < 0.0 {
            return Err("Minimum price must not be negative.".to_string());
        }
        if min > max {
            return Err("Minimum price must not exceed maximum price.".to_string());
        }
        Ok(Self {
            price_min: Some(min),
            price_max: Some(max),
        })
    }
}

/// `POST /streamer/lis-skins/purchase-status` and `/test-purchase`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PurchaseStatusResponse {
    #[serde(default)]
    pub purchase_id: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub delivery_status: Option<String>,
    #[serde(default)]
    pub skin_name: Option<String>,
    #[serde(default)]
    pub skin_price: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PrizeStreamer {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub twitch_login: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentPrize {
    pub id: i64,
    #[serde(default)]
    pub skin_name: Option<String>,
    #[serde(default)]
    pub skin_price: Option<f64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub event_key: Option<String>,
    #[serde(default)]
    pub winner_twitch_login: Option<String>,
    #[serde(default)]
    pub streamer: Option<PrizeStreamer>,
}

/// `GET /public/recent-prizes?limit=`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecentPrizes {
    #[serde(default)]
    pub items: Vec<RecentPrize>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StreamerCard {
    pub id: i64,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub twitch_login: Option<String>,
    #[serde(default)]
    pub twitch_display_name: Option<String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
    #[serde(default)]
    pub telegram_channel_url: Option<String>,
}

impl StreamerCard {
    pub fn name(&self) -> &str {
        self.twitch_display_name
            .as_deref()
            .or(self.display_name.as_deref())
            .or(self.twitch_login.as_deref())
            .unwrap_or("?")
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LiveStatus {
    #[serde(default)]
    pub is_live: bool,
    #[serde(default)]
    pub viewer_count: u64,
    #[serde(default)]
    pub game_name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StreamerStats {
    #[serde(default)]
    pub total_prizes: u64,
    #[serde(default)]
    pub total_amount: f64,
    #[serde(default)]
    pub stream_prizes: u64,
    #[serde(default)]
    pub stream_amount: f64,
    #[serde(default)]
    pub stream_participants: u64,
}

/// A prize won on one streamer's channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamerPrize {
    pub id: i64,
    #[serde(default)]
    pub skin_name: Option<String>,
    #[serde(default)]
    pub skin_price: Option<f64>,
    #[serde(default)]
    pub delivery_status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub event_key: Option<String>,
    #[serde(default)]
    pub twitch_login: Option<String>,
    #[serde(default)]
    pub trade_offer_expiry_at: Option<String>,
}

impl StreamerPrize {
    pub fn status(&self) -> PurchaseStatus {
        self.delivery_status
            .as_deref()
            .map(PurchaseStatus::parse)
            .unwrap_or(PurchaseStatus::Requested)
    }
}

/// `GET /streamers/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamerProfile {
    pub streamer: StreamerCard,
    #[serde(default)]
    pub live: LiveStatus,
    #[serde(default)]
    pub stats: StreamerStats,
    #[serde(default)]
    pub recent_prizes: Vec<StreamerPrize>,
}

/// `GET /streamers/{id}/prizes?limit=&offset=`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StreamerPrizes {
    #[serde(default)]
    pub items: Vec<StreamerPrize>,
    #[serde(default)]
    pub total: u64,
}

impl StreamerPrizes {
    pub fn page_count(&self, page_size: u32) -> u64 {
        if page_size == 0 {
            return 0;
        }
        self.total.div_ceil(page_size as u64)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Participant {
    #[serde(default)]
    pub twitch_login: Option<String>,
    #[serde(default)]
    pub last_chat_at: Option<String>,
}

/// `GET /streamers/{id}/participants`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Participants {
    #[serde(default)]
    pub items: Vec<Participant>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveStreamer {
    pub id: i64,
    #[serde(default)]
    pub twitch_login: Option<String>,
    #[serde(default)]
    pub twitch_display_name: Option<String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
    #[serde(default)]
    pub is_live: bool,
    #[serde(default)]
    pub game_name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub viewer_count: u64,
    #[serde(default)]
    pub started_at: Option<String>,
}

/// `GET /streamers/live`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LiveStreamers {
    #[serde(default)]
    pub streamers: Vec<LiveStreamer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowerPoint {
    pub date: String,
    #[serde(default)]
    pub count: u64,
}

/// `GET /streamer/followers/stats`, keyed by window length in days.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FollowerStats {
    #[serde(default)]
    pub has_data: bool,
    #[serde(default)]
    pub ranges: BTreeMap<String, Vec<FollowerPoint>>,
}

impl FollowerStats {
    pub fn range(&self, days: u32) -> &[FollowerPoint] {
        self.ranges
            .get(&days.to_string())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
