//! Giveaway-service domain: wire models and the client-side state
//! machines for account linking and purchase delivery.

pub mod link;
pub mod models;
pub mod purchase;

pub use link::{LinkIntent, LinkReducer, LinkState};
pub use models::{
    AuthorizeUrl, BulkEventSettings, Eligibility, EventConfig, EventRow, EventUpdate,
    ExchangeResult, FollowerPoint, FollowerStats, LiveStatus, LiveStreamer, LiveStreamers,
    Participant, Participants, PriceRange, PrizeStreamer, PurchaseStatusResponse, RecentPrize,
    RecentPrizes, StreamerCard, StreamerInfo, StreamerMe, StreamerPrize, StreamerPrizes,
    StreamerProfile, StreamerStats, TrackedStreamer, TrackedStreamers, TradeUrl, ViewerProfile,
};
pub use purchase::{PurchaseIntent, PurchaseReducer, PurchaseState, PurchaseStatus};
