//! HTTP transport for the giveaway service.

mod client;
mod error;

pub use client::{build_auth_header, AuthHeader, Transport};
pub use error::TransportError;
