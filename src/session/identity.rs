//! Host identity assertions.
//!
//! The embedding platform hands the client an opaque payload once; the
//! session manager trades it for a token. Providers report absence with
//! `None`, never with an error.

use async_trait::async_trait;

use super::secure::SecureString;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The current host assertion, if the host supplied one.
    async fn assertion(&self) -> Option<SecureString>;
}

/// Reads the assertion from an environment variable at call time.
pub struct EnvIdentity {
    var: String,
}

impl EnvIdentity {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

#[async_trait]
impl IdentityProvider for EnvIdentity {
    async fn assertion(&self) -> Option<SecureString> {
        std::env::var(&self.var)
            .ok()
            .map(SecureString::new)
            .filter(|value| !value.is_empty())
    }
}

/// Fixed assertion. `StaticIdentity::none()` models running outside the host.
pub struct StaticIdentity(Option<SecureString>);

impl StaticIdentity {
    pub fn new(assertion: impl Into<String>) -> Self {
        Self(Some(SecureString::new(assertion)))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn assertion(&self) -> Option<SecureString> {
        self.0.clone().filter(|value| !value.is_empty())
    }
}
