//! Failure classification for remote calls.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors produced by a single HTTP exchange with the service.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The service answered with a non-2xx status. `message` is the raw body.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The request never produced a response.
    #[error("Connection to '{url}' failed: {source}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Request exceeded the configured total timeout.
    #[error("Request timeout after {duration}s")]
    Timeout { duration: u64 },

    /// 2xx response whose body was not the expected JSON.
    #[error("Invalid response body: {0}")]
    Decode(String),

    /// Path or URL could not be turned into a request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl TransportError {
    /// Numeric status, when the service produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The credential was rejected (HTTP 401).
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED.as_u16())
    }

    /// Short machine-readable kind for logs.
    pub fn error_type(&self) -> &'static str {
        match self {
            TransportError::Status { .. } => "status",
            TransportError::Connection { .. } => "connection_error",
            TransportError::Timeout { .. } => "request_timeout",
            TransportError::Decode(_) => "decode_error",
            TransportError::InvalidRequest(_) => "invalid_request",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_is_detected_by_status() {
        let err = TransportError::Status {
            status: 401,
            message: "expired".to_string(),
        };
        assert!(err.is_unauthorized());
        assert_eq!(err.status(), Some(401));
    }

    #[test]
    fn other_statuses_are_not_unauthorized() {
        let err = TransportError::Status {
            status: 403,
            message: "forbidden".to_string(),
        };
        assert!(!err.is_unauthorized());
        assert!(!TransportError::Timeout { duration: 5 }.is_unauthorized());
    }

    #[test]
    fn message_carries_body_text() {
        let err = TransportError::Status {
            status: 404,
            message: "streamer not found".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 404: streamer not found");
        assert_eq!(err.error_type(), "status");
    }
}
