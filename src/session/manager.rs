//! Credential acquisition and bounded re-authentication.

use std::future::Future;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::transport::{Transport, TransportError};

use super::identity::IdentityProvider;
use super::secure::SecureString;
use super::store::CredentialStore;

pub const TELEGRAM_AUTH_PATH: &str = "/auth/telegram";
pub const DEV_AUTH_PATH: &str = "/auth/dev";

#[derive(Debug, Error)]
pub enum SessionError {
    /// No stored token and the host supplied no identity.
    #[error("No session and no host identity; please open the app from its host context")]
    AuthUnavailable,

    /// The service rejected a freshly acquired credential as well.
    #[error("Authentication rejected: {message}")]
    AuthRejected { message: String },

    /// The identity exchange answered 2xx without a token.
    #[error("{endpoint} did not return a token")]
    MissingToken { endpoint: &'static str },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: Option<String>,
}

/// Owns the single session credential for a client instance.
///
/// `ensure` is optimistic: a stored token is trusted until the service
/// rejects it, and rejection is handled by `with_reauth`.
#[derive(Clone)]
pub struct SessionManager {
    transport: Transport,
    store: Arc<dyn CredentialStore>,
    identity: Arc<dyn IdentityProvider>,
}

impl SessionManager {
    pub fn new(
        transport: Transport,
        store: Arc<dyn CredentialStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            transport,
            store,
            identity,
        }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.read().is_some()
    }

    /// Return a usable token, acquiring one from the host identity if needed.
    ///
    /// A stored token is returned without touching the network.
    pub async fn ensure(&self) -> Result<SecureString, SessionError> {
        if let Some(token) = self.store.read() {
            return Ok(token);
        }

        let Some(assertion) = self.identity.assertion().await else {
            tracing::warn!("No stored session and no host identity available");
            return Err(SessionError::AuthUnavailable);
        };

        tracing::info!("Exchanging host identity for a session token");
        let response: TokenResponse = self
            .transport
            .post_json(TELEGRAM_AUTH_PATH, &json!({ "initData": assertion.expose() }))
            .await?;

        self.accept_token(response, TELEGRAM_AUTH_PATH)
    }

    /// Manual login for development builds running outside the host.
    pub async fn login_dev(&self, telegram_id: i64) -> Result<SecureString, SessionError> {
        tracing::info!(telegram_id, "Performing dev login");
        let response: TokenResponse = self
            .transport
            .post_json(DEV_AUTH_PATH, &json!({ "telegram_id": telegram_id }))
            .await?;

        self.accept_token(response, DEV_AUTH_PATH)
    }

    /// Forget the session (explicit logout or account deletion).
    pub fn logout(&self) {
        self.store.clear();
        tracing::info!("Session cleared");
    }

    /// Run a protected call with a single re-authentication on 401.
    ///
    /// On the first 401 the stale token is dropped, a new one is acquired
    /// and `op` is retried once. A second 401 is terminal. Every call has
    /// its own budget, so concurrent callers never loop on each other.
    pub async fn with_reauth<T, F, Fut>(&self, mut op: F) -> Result<T, SessionError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
    {
        let used = self.ensure().await?;

        match op().await {
            Ok(value) => Ok(value),
            Err(e) if e.is_unauthorized() => {
                tracing::info!("Session token rejected, re-acquiring once");
                self.invalidate(&used);
                self.ensure().await?;

                match op().await {
                    Ok(value) => Ok(value),
                    Err(e) if e.is_unauthorized() => {
                        tracing::warn!("Session rejected after re-acquisition");
                        Err(SessionError::AuthRejected {
                            message: rejection_message(e),
                        })
                    }
                    Err(e) => Err(e.into()),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Drop `rejected` unless another caller already replaced it.
    fn invalidate(&self, rejected: &SecureString) {
        if self.store.read().as_ref() == Some(rejected) {
            self.store.clear();
        }
    }

    fn accept_token(
        &self,
        response: TokenResponse,
        endpoint: &'static str,
    ) -> Result<SecureString, SessionError> {
        let token = response
            .token
            .map(SecureString::new)
            .filter(|token| !token.is_empty())
            .ok_or(SessionError::MissingToken { endpoint })?;

        self.store.write(token.clone());
        tracing::info!(endpoint, "Session token stored");
        Ok(token)
    }
}

fn rejection_message(err: TransportError) -> String {
    match err {
        TransportError::Status { message, .. } => message,
        other => other.to_string(),
    }
}
