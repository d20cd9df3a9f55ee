//! Session credential lifecycle: storage, host identity, acquisition.

mod identity;
mod manager;
mod secure;
mod store;

pub use identity::{EnvIdentity, IdentityProvider, StaticIdentity};
pub use manager::{SessionError, SessionManager, DEV_AUTH_PATH, TELEGRAM_AUTH_PATH};
pub use secure::SecureString;
pub use store::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
