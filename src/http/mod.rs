//! HTTP execution layer: transport seam, retry policy and the retrying client.

mod client;
mod retry;
mod transport;

pub use client::{ApiClient, HttpResponse, ReturnPrefer, ACCEPT_MEDIA_TYPE};
pub use retry::{ExponentialBackoff, RetryContext, RetryPolicy, MAX_TOTAL_ATTEMPTS};
pub use transport::{ReqwestTransport, Transport, TransportError, TransportResponse};

#[cfg(test)]
pub use transport::MockTransport;

/// One failed HTTP attempt, as seen by the retry policy and the error
/// classifier.
///
/// Transient: constructed per failed attempt, consumed immediately.
#[derive(Debug, Clone)]
pub struct HttpFailure {
    /// HTTP status code, absent when no response was received.
    pub status: Option<u16>,
    /// Raw response body, absent when no response was received or the body
    /// was empty.
    pub body: Option<String>,
    /// Original error text for failures without a server response.
    pub message: Option<String>,
}

impl HttpFailure {
    /// Build a failure from a non-success HTTP response.
    pub fn from_response(response: &TransportResponse) -> Self {
        Self {
            status: Some(response.status),
            body: response.body.clone(),
            message: None,
        }
    }

    /// Build a failure from a transport-level error.
    pub fn from_transport_error(error: &TransportError) -> Self {
        Self {
            status: error.status,
            body: error.body.clone(),
            message: Some(error.message.clone()),
        }
    }
}
