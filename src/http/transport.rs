//! Injected HTTP transport abstraction.
//!
//! The execution layer talks to the network only through [`Transport`]. The
//! default implementation wraps a [`reqwest::Client`]; tests inject mocks.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use reqwest::Client;

/// Raw response from one transport call.
///
/// Any HTTP response, success or not, is returned as `Ok` with its status
/// code; the execution layer decides what counts as a failure.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body text, absent when the server sent none.
    pub body: Option<String>,
    /// Response headers, keys lowercased.
    pub headers: HashMap<String, String>,
}

/// Failure to complete a transport call.
///
/// `status` and `body` are populated when the server replied before the call
/// failed; pure network failures (DNS, refused connection) carry neither.
#[derive(Debug)]
pub struct TransportError {
    /// Human-readable description of the failure.
    pub message: String,
    /// HTTP status code, when a response was received.
    pub status: Option<u16>,
    /// Response body, when a response was received.
    pub body: Option<String>,
}

impl TransportError {
    /// Create a transport error with no associated server response.
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            body: None,
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "Transport error (status {}): {}", status, self.message),
            None => write!(f, "Transport error: {}", self.message),
        }
    }
}

impl std::error::Error for TransportError {}

/// HTTP transport capability consumed by the execution layer.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform a GET request.
    async fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<TransportResponse, TransportError>;

    /// Perform a POST request with an optional body.
    async fn post(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: Option<String>,
    ) -> Result<TransportResponse, TransportError>;

    /// Perform a PATCH request with an optional body.
    async fn patch(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: Option<String>,
    ) -> Result<TransportResponse, TransportError>;

    /// Perform a DELETE request.
    async fn delete(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<TransportResponse, TransportError>;
}

/// Default transport backed by [`reqwest::Client`].
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport wrapping the given reqwest Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn send(
        &self,
        method: reqwest::Method,
        url: &str,
        headers: &[(String, String)],
        body: Option<String>,
    ) -> Result<TransportResponse, TransportError> {
        let mut request = self.client.request(method, url);
        for (name, value) in headers {
            request = request.header(name, value);
        }
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::network(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_lowercase(), v.to_string()))
            })
            .collect();
        let text = response.text().await.map_err(|e| TransportError {
            message: format!("Failed to read response body: {}", e),
            status: Some(status),
            body: None,
        })?;

        Ok(TransportResponse {
            status,
            body: if text.is_empty() { None } else { Some(text) },
            headers,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<TransportResponse, TransportError> {
        self.send(reqwest::Method::GET, url, headers, None).await
    }

    async fn post(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: Option<String>,
    ) -> Result<TransportResponse, TransportError> {
        self.send(reqwest::Method::POST, url, headers, body).await
    }

    async fn patch(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: Option<String>,
    ) -> Result<TransportResponse, TransportError> {
        self.send(reqwest::Method::PATCH, url, headers, body).await
    }

    async fn delete(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<TransportResponse, TransportError> {
        self.send(reqwest::Method::DELETE, url, headers, None).await
    }
}
