//! Crate-level error taxonomy.
//!
//! Every remote call site maps its failure into one of these variants so
//! callers can decide between showing feedback and degrading silently.

use thiserror::Error;

use crate::config::ConfigError;
use crate::session::SessionError;
use crate::transport::TransportError;

#[derive(Debug, Error)]
pub enum SyncError {
    /// No credential and no way to obtain one. Terminal.
    #[error("Not signed in: please open the app from the expected host context")]
    AuthUnavailable,

    /// The credential was rejected even after one re-acquisition.
    #[error("Authentication failed: {message}")]
    AuthRejected { message: String },

    /// The service answered with a non-2xx status other than 401.
    #[error("Request failed ({status}): {message}")]
    Remote { status: u16, message: String },

    /// The request could not be completed (network, timeout, bad body).
    #[error("Network error: {0}")]
    Network(#[source] TransportError),

    /// Every fetch of a screen batch failed and nothing was cached.
    #[error("Nothing could be loaded ({failed} requests failed)")]
    AggregateFailed { failed: usize },

    /// Input rejected locally before any request was made.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl SyncError {
    /// Authentication problems need the user to re-open the app; retrying
    /// in the background will not help.
    pub fn is_auth(&self) -> bool {
        matches!(self, SyncError::AuthUnavailable | SyncError::AuthRejected { .. })
    }

    /// An owned copy of this error if it is an authentication failure.
    pub fn auth_error(&self) -> Option<SyncError> {
        match self {
            SyncError::AuthUnavailable => Some(SyncError::AuthUnavailable),
            SyncError::AuthRejected { message } => Some(SyncError::AuthRejected {
                message: message.clone(),
            }),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            SyncError::Remote { status, .. } => Some(*status),
            SyncError::AuthRejected { .. } => Some(401),
            _ => None,
        }
    }
}

impl From<TransportError> for SyncError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Status { status: 401, message } => SyncError::AuthRejected { message },
            TransportError::Status { status, message } => SyncError::Remote { status, message },
            other => SyncError::Network(other),
        }
    }
}

impl From<SessionError> for SyncError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::AuthUnavailable => SyncError::AuthUnavailable,
            SessionError::AuthRejected { message } => SyncError::AuthRejected { message },
            SessionError::MissingToken { endpoint } => SyncError::AuthRejected {
                message: format!("{} did not return a token", endpoint),
            },
            SessionError::Transport(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_split_on_401() {
        let rejected: SyncError = TransportError::Status {
            status: 401,
            message: "expired".into(),
        }
        .into();
        assert!(rejected.is_auth());

        let remote: SyncError = TransportError::Status {
            status: 404,
            message: "missing".into(),
        }
        .into();
        assert!(matches!(remote, SyncError::Remote { status: 404, .. }));
        assert!(!remote.is_auth());
    }

    #[test]
    fn session_errors_keep_their_class() {
        let err: SyncError = SessionError::AuthUnavailable.into();
        assert!(matches!(err, SyncError::AuthUnavailable));
        assert!(matches!(err.auth_error(), Some(SyncError::AuthUnavailable)));

        let err: SyncError = SessionError::Transport(TransportError::Timeout { duration: 3 }).into();
        assert!(matches!(err, SyncError::Network(_)));
        assert_eq!(err.status(), None);
        assert!(err.auth_error().is_none());
    }
}
