use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::header::{AUTHORIZATION, CACHE_CONTROL, PRAGMA};
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::time::timeout;
use uuid::Uuid;

use crate::config::ApiConfig;
use crate::session::{CredentialStore, SecureString};

use super::error::TransportError;

/// Header name and value for authentication.
pub type AuthHeader = (String, String);

/// Build the bearer header for the current credential, if any.
pub fn build_auth_header(token: Option<&SecureString>) -> Option<AuthHeader> {
    match token {
        Some(token) if !token.is_empty() => Some((
            AUTHORIZATION.as_str().to_string(),
            format!("Bearer {}", token.expose()),
        )),
        _ => None,
    }
}

/// Authenticated JSON-over-HTTP client for the giveaway service.
///
/// Reads the credential store on every request but never writes it;
/// invalidation is the session manager's job.
#[derive(Clone)]
pub struct Transport {
    client: Client,
    base_url: String,
    timeout: Duration,
    store: Arc<dyn CredentialStore>,
}

impl Transport {
    pub fn new(api: &ApiConfig, store: Arc<dyn CredentialStore>) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(api.connect_timeout())
            .build()
            .map_err(|e| TransportError::InvalidRequest(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            timeout: api.timeout(),
            store,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue a request and return the parsed JSON body.
    ///
    /// Empty 2xx bodies come back as `Value::Null`. Any non-2xx status is
    /// reported as `TransportError::Status` with the body text as message.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, TransportError> {
        let request_id = Uuid::new_v4();
        let url = self.build_url(&method, path)?;

        tracing::debug!(
            request_id = %request_id,
            method = %method,
            path = %path,
            "Sending request"
        );

        let result = timeout(self.timeout, self.do_request(method.clone(), url, body)).await;

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(_) => Err(TransportError::Timeout {
                duration: self.timeout.as_secs(),
            }),
        };

        match &outcome {
            Ok(_) => tracing::trace!(request_id = %request_id, "Request succeeded"),
            Err(e) => tracing::debug!(
                request_id = %request_id,
                method = %method,
                path = %path,
                kind = e.error_type(),
                status = ?e.status(),
                "Request failed"
            ),
        }
        outcome
    }

    pub async fn get(&self, path: &str) -> Result<Value, TransportError> {
        self.request(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<Value, TransportError> {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value, TransportError> {
        self.request(Method::DELETE, path, None).await
    }

    /// GET and decode into `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, TransportError> {
        decode(self.get(path).await?)
    }

    /// POST a serializable body and decode the answer into `T`.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, TransportError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)
            .map_err(|e| TransportError::InvalidRequest(format!("Failed to encode body: {}", e)))?;
        decode(self.post(path, &body).await?)
    }

    fn build_url(&self, method: &Method, path: &str) -> Result<Url, TransportError> {
        let joined = if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        };
        let mut url = Url::parse(&joined)
            .map_err(|e| TransportError::InvalidRequest(format!("Invalid URL '{}': {}", joined, e)))?;

        // GETs must always reach the origin, so every read gets a unique query.
        if *method == Method::GET {
            url.query_pairs_mut()
                .append_pair("_t", &unix_millis().to_string());
        }
        Ok(url)
    }

    async fn do_request(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
    ) -> Result<Value, TransportError> {
        let url_text = url.to_string();
        let is_get = method == Method::GET;
        let mut builder = self.client.request(method, url);

        if let Some((name, value)) = build_auth_header(self.store.read().as_ref()) {
            builder = builder.header(name, value);
        }

        if is_get {
            builder = builder
                .header(CACHE_CONTROL, "no-store, no-cache, must-revalidate")
                .header(PRAGMA, "no-cache");
        }

        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Connection {
                url: strip_query(&url_text),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(TransportError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::Decode(format!("Failed to read response body: {}", e)))?;

        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&bytes)
            .map_err(|e| TransportError::Decode(format!("Failed to parse response JSON: {}", e)))
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, TransportError> {
    serde_json::from_value(value).map_err(|e| TransportError::Decode(e.to_string()))
}

fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

fn strip_query(url: &str) -> String {
    url.split('?').next().unwrap_or(url).to_string()
}
