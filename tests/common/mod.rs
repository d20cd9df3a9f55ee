//! Shared test utilities and mock infrastructure.

#![allow(dead_code, unused_imports)]

pub mod mock_backend;

use giveaway_sync::config::ApiConfig;
use giveaway_sync::session::{
    CredentialStore, IdentityProvider, MemoryCredentialStore, SessionManager, StaticIdentity,
};
use giveaway_sync::transport::Transport;
use giveaway_sync::ServiceClient;
use std::sync::{Arc, Mutex, MutexGuard};

use mock_backend::MockBackend;

/// Serializes tests that touch process environment variables.
static ENV_LOCK: Mutex<()> = Mutex::new(());

pub fn env_lock() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub fn api_config(base_url: &str) -> ApiConfig {
    ApiConfig {
        base_url: base_url.to_string(),
        timeout_seconds: 5,
        connect_timeout_seconds: 2,
    }
}

/// Build a client against `mock`, returning the store for assertions.
///
/// `token` pre-seeds the store; `identity` is the host assertion, if any.
pub fn client_for(
    mock: &MockBackend,
    token: Option<&str>,
    identity: Option<&str>,
) -> (ServiceClient, Arc<MemoryCredentialStore>) {
    let store = Arc::new(match token {
        Some(token) => MemoryCredentialStore::with_token(token),
        None => MemoryCredentialStore::new(),
    });
    let dyn_store: Arc<dyn CredentialStore> = store.clone();
    let identity: Arc<dyn IdentityProvider> = Arc::new(match identity {
        Some(assertion) => StaticIdentity::new(assertion),
        None => StaticIdentity::none(),
    });

    let transport = Transport::new(&api_config(&mock.base_url()), dyn_store.clone())
        .expect("transport");
    let session = SessionManager::new(transport, dyn_store, identity);
    (ServiceClient::new(session), store)
}
