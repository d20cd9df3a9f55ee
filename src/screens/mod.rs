//! Screen models: state and actions behind each screen, without rendering.

pub mod dashboard;
pub mod events;
pub mod link;
pub mod lis_skins;
pub mod purchases;
pub mod streamer;

pub use dashboard::{Dashboard, DashboardModel};
pub use events::{BulkApplyReport, EventsModel};
pub use link::{LinkFlow, LinkOpener, RecordingOpener};
pub use lis_skins::{LisSkinsModel, LisSkinsSettings};
pub use purchases::{start_background_refresh, PurchaseTracker};
pub use streamer::{StreamerPage, StreamerPageModel};
