pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod mvi;
pub mod screens;
pub mod session;
pub mod sync;
pub mod transport;

pub use api::ServiceClient;
pub use error::SyncError;
