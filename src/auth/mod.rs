//! Authorization boundary for API requests.
//!
//! The client never caches credentials: the provider is invoked freshly for
//! every HTTP attempt, so token refresh stays the provider's concern.

use anyhow::Result;
use async_trait::async_trait;

/// Credential used to build the `Authorization` header of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationInfo {
    /// Header scheme (e.g. "Bearer").
    pub scheme: String,
    /// Opaque token value.
    pub token: String,
}

impl AuthorizationInfo {
    /// Create a new authorization credential.
    pub fn new(scheme: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            token: token.into(),
        }
    }

    /// Render the credential as an `Authorization` header value.
    pub fn header_value(&self) -> String {
        format!("{} {}", self.scheme, self.token)
    }
}

/// Supplies the credential for API requests.
///
/// Called once per HTTP attempt, including retries of the same logical
/// operation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthorizationProvider: Send + Sync {
    /// Get the credential to attach to the next request.
    async fn get_authorization(&self) -> Result<AuthorizationInfo>;
}

/// Provider returning a fixed scheme/token pair.
///
/// Useful for tests and for callers that refresh tokens externally.
pub struct StaticAuthorizationProvider {
    info: AuthorizationInfo,
}

impl StaticAuthorizationProvider {
    /// Create a provider that always returns the given credential.
    pub fn new(scheme: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            info: AuthorizationInfo::new(scheme, token),
        }
    }
}

#[async_trait]
impl AuthorizationProvider for StaticAuthorizationProvider {
    async fn get_authorization(&self) -> Result<AuthorizationInfo> {
        Ok(self.info.clone())
    }
}
