//! Retrying HTTP client over the injected transport.
//!
//! One logical operation may span several transport attempts. The retry
//! policy decides whether to continue; the final failure is classified into
//! an [`ApiError`](crate::error::ApiError) before it reaches the caller.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, warn};
use serde_json::Value;

use crate::auth::AuthorizationProvider;
use crate::error;

use super::retry::{RetryContext, RetryPolicy};
use super::transport::{Transport, TransportError, TransportResponse};
use super::HttpFailure;

/// Accept media type sent with every request.
pub const ACCEPT_MEDIA_TYPE: &str = "application/vnd.bentley.itwin-platform.v2+json";

/// Requested representation depth for read operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnPrefer {
    Minimal,
    Representation,
}

impl ReturnPrefer {
    /// Value for the `Prefer` header.
    pub fn header_value(&self) -> &'static str {
        match self {
            ReturnPrefer::Minimal => "return=minimal",
            ReturnPrefer::Representation => "return=representation",
        }
    }
}

/// Unwrapped successful response.
#[derive(Debug)]
pub struct HttpResponse {
    /// Parsed JSON body, absent for empty responses.
    pub body: Option<Value>,
    /// Response headers, keys lowercased.
    pub headers: HashMap<String, String>,
}

/// HTTP entry point shared by all operations.
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    authorization: Arc<dyn AuthorizationProvider>,
    retry_policy: Option<Arc<dyn RetryPolicy>>,
}

impl ApiClient {
    /// Create a client over the given transport and authorization provider.
    ///
    /// `retry_policy` of `None` surfaces the first failure immediately.
    pub fn new(
        transport: Arc<dyn Transport>,
        authorization: Arc<dyn AuthorizationProvider>,
        retry_policy: Option<Arc<dyn RetryPolicy>>,
    ) -> Self {
        Self {
            transport,
            authorization,
            retry_policy,
        }
    }

    /// Perform a GET request.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, url: &str, prefer: Option<ReturnPrefer>) -> Result<HttpResponse> {
        debug!("GET {}...", url);

        self.execute("GET", || async {
            let headers = self.request_headers(prefer, false).await?;
            self.transport
                .get(url, &headers)
                .await
                .map_err(anyhow::Error::from)
        })
        .await
    }

    /// Perform a POST request with a JSON body.
    #[tracing::instrument(skip(self, body))]
    pub async fn post(&self, url: &str, body: &Value) -> Result<HttpResponse> {
        debug!("POST {}...", url);

        let payload = serde_json::to_string(body).context("Failed to serialize request body")?;
        self.execute("POST", || async {
            let headers = self.request_headers(None, true).await?;
            self.transport
                .post(url, &headers, Some(payload.clone()))
                .await
                .map_err(anyhow::Error::from)
        })
        .await
    }

    /// Perform a PATCH request with a JSON body.
    #[tracing::instrument(skip(self, body))]
    pub async fn patch(&self, url: &str, body: &Value) -> Result<HttpResponse> {
        debug!("PATCH {}...", url);

        let payload = serde_json::to_string(body).context("Failed to serialize request body")?;
        self.execute("PATCH", || async {
            let headers = self.request_headers(None, true).await?;
            self.transport
                .patch(url, &headers, Some(payload.clone()))
                .await
                .map_err(anyhow::Error::from)
        })
        .await
    }

    /// Perform a DELETE request.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, url: &str) -> Result<HttpResponse> {
        debug!("DELETE {}...", url);

        self.execute("DELETE", || async {
            let headers = self.request_headers(None, false).await?;
            self.transport
                .delete(url, &headers)
                .await
                .map_err(anyhow::Error::from)
        })
        .await
    }

    /// Drive one logical operation across transport attempts.
    ///
    /// Each invocation of `attempt` performs one underlying call, including a
    /// fresh authorization lookup. Failures that are not transport failures
    /// (e.g. the authorization provider erroring) propagate without retry or
    /// classification.
    async fn execute<F, Fut>(&self, operation_name: &str, attempt: F) -> Result<HttpResponse>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<TransportResponse>>,
    {
        let mut attempt_index: u32 = 0;

        loop {
            let failure = match attempt().await {
                Ok(response) if response.status < 400 => return unwrap_response(response),
                Ok(response) => HttpFailure::from_response(&response),
                Err(error) => match error.downcast::<TransportError>() {
                    Ok(transport_error) => HttpFailure::from_transport_error(&transport_error),
                    Err(other) => return Err(other),
                },
            };

            let context = RetryContext {
                attempt_index,
                failure: &failure,
            };
            let retry_delay_ms = self
                .retry_policy
                .as_deref()
                .and_then(|policy| policy.should_retry(&context).then(|| policy.delay_ms(&context)));

            let Some(delay_ms) = retry_delay_ms else {
                return Err(anyhow::Error::from(error::parse(&failure)));
            };

            warn!(
                "{}: attempt {} failed (status {:?}), retrying in {}ms...",
                operation_name,
                attempt_index + 1,
                failure.status,
                delay_ms
            );
            if delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
            attempt_index += 1;
        }
    }

    async fn request_headers(
        &self,
        prefer: Option<ReturnPrefer>,
        has_body: bool,
    ) -> Result<Vec<(String, String)>> {
        let authorization = self.authorization.get_authorization().await?;

        let mut headers = vec![
            ("Authorization".to_string(), authorization.header_value()),
            ("Accept".to_string(), ACCEPT_MEDIA_TYPE.to_string()),
        ];
        if let Some(prefer) = prefer {
            headers.push(("Prefer".to_string(), prefer.header_value().to_string()));
        }
        if has_body {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }
        Ok(headers)
    }
}

fn unwrap_response(response: TransportResponse) -> Result<HttpResponse> {
    let body = response
        .body
        .as_deref()
        .map(serde_json::from_str)
        .transpose()
        .context("Failed to parse JSON response")?;

    Ok(HttpResponse {
        body,
        headers: response.headers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthorizationInfo, MockAuthorizationProvider, StaticAuthorizationProvider};
    use crate::error::{ApiError, ApiErrorCode};
    use crate::http::{MockTransport, ReqwestTransport};
    use crate::test_utils::instant_retries;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn static_auth() -> Arc<dyn AuthorizationProvider> {
        Arc::new(StaticAuthorizationProvider::new("Bearer", "test-token"))
    }

    fn reqwest_client(retry_policy: Option<Arc<dyn RetryPolicy>>) -> ApiClient {
        ApiClient::new(
            Arc::new(ReqwestTransport::new(reqwest::Client::new())),
            static_auth(),
            retry_policy,
        )
    }

    #[tokio::test]
    async fn test_get_success_unwraps_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/imodels/1")
            .with_status(200)
            .with_body(r#"{"iModel":{"id":"1"}}"#)
            .create_async()
            .await;

        let client = reqwest_client(None);
        let response = client
            .get(&format!("{}/imodels/1", server.url()), None)
            .await
            .unwrap();

        mock.assert_async().await;
        let body = response.body.unwrap();
        assert_eq!(body["iModel"]["id"], "1");
    }

    #[tokio::test]
    async fn test_request_carries_contract_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/imodels")
            .match_header("authorization", "Bearer test-token")
            .match_header("accept", ACCEPT_MEDIA_TYPE)
            .match_header("prefer", "return=minimal")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client = reqwest_client(None);
        client
            .get(
                &format!("{}/imodels", server.url()),
                Some(ReturnPrefer::Minimal),
            )
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_content_type_only_sent_with_body() {
        let mut server = mockito::Server::new_async().await;
        let get_mock = server
            .mock("GET", "/imodels")
            .match_header("content-type", mockito::Matcher::Missing)
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;
        let post_mock = server
            .mock("POST", "/imodels")
            .match_header("content-type", "application/json")
            .with_status(201)
            .with_body("{}")
            .create_async()
            .await;

        let client = reqwest_client(None);
        let url = format!("{}/imodels", server.url());
        client.get(&url, None).await.unwrap();
        client.post(&url, &serde_json::json!({"name": "x"})).await.unwrap();

        get_mock.assert_async().await;
        post_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_failure_without_policy_surfaces_immediately() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/imodels/missing")
            .with_status(404)
            .with_body(r#"{"error":{"code":"iModelNotFound","message":"gone"}}"#)
            .expect(1)
            .create_async()
            .await;

        let client = reqwest_client(None);
        let error = client
            .get(&format!("{}/imodels/missing", server.url()), None)
            .await
            .unwrap_err();

        mock.assert_async().await;
        let api_error = error.downcast_ref::<ApiError>().unwrap();
        assert_eq!(api_error.code, ApiErrorCode::IModelNotFound);
    }

    #[tokio::test]
    async fn test_persistent_failure_makes_max_retries_plus_one_attempts() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/imodels")
            .with_status(500)
            .with_body(r#"{"error":{"code":"Whatever"}}"#)
            .expect(3)
            .create_async()
            .await;

        let client = reqwest_client(instant_retries(2));
        let error = client
            .get(&format!("{}/imodels", server.url()), None)
            .await
            .unwrap_err();

        mock.assert_async().await;
        // The last failure's classification is what surfaces.
        let api_error = error.downcast_ref::<ApiError>().unwrap();
        assert_eq!(api_error.code, ApiErrorCode::Unrecognized);
    }

    #[tokio::test]
    async fn test_retry_recovers_after_transient_failure() {
        let calls = AtomicUsize::new(0);
        let mut transport = MockTransport::new();
        transport.expect_get().times(3).returning(move |_, _| {
            let call = calls.fetch_add(1, Ordering::SeqCst);
            if call < 2 {
                Err(TransportError::network("connection reset"))
            } else {
                Ok(TransportResponse {
                    status: 200,
                    body: Some(r#"{"ok":true}"#.to_string()),
                    headers: HashMap::new(),
                })
            }
        });

        let client = ApiClient::new(Arc::new(transport), static_auth(), instant_retries(3));
        let response = client.get("http://unit.test/imodels", None).await.unwrap();

        assert_eq!(response.body.unwrap()["ok"], true);
    }

    #[tokio::test]
    async fn test_network_failure_still_classifies() {
        let mut transport = MockTransport::new();
        transport
            .expect_get()
            .times(1)
            .returning(|_, _| Err(TransportError::network("dns lookup failed")));

        let client = ApiClient::new(Arc::new(transport), static_auth(), None);
        let error = client.get("http://unit.test/imodels", None).await.unwrap_err();

        let api_error = error.downcast_ref::<ApiError>().unwrap();
        assert_eq!(api_error.code, ApiErrorCode::Unknown);
        assert!(api_error.message.contains("dns lookup failed"));
    }

    #[tokio::test]
    async fn test_authorization_fetched_fresh_per_attempt() {
        let mut authorization = MockAuthorizationProvider::new();
        authorization
            .expect_get_authorization()
            .times(3)
            .returning(|| Ok(AuthorizationInfo::new("Bearer", "t")));

        let mut transport = MockTransport::new();
        transport
            .expect_get()
            .times(3)
            .returning(|_, _| Err(TransportError::network("timeout")));

        let client = ApiClient::new(Arc::new(transport), Arc::new(authorization), instant_retries(2));
        let _ = client.get("http://unit.test/imodels", None).await;
    }

    #[tokio::test]
    async fn test_authorization_error_is_not_retried_or_classified() {
        let mut authorization = MockAuthorizationProvider::new();
        authorization
            .expect_get_authorization()
            .times(1)
            .returning(|| Err(anyhow::anyhow!("token acquisition failed")));

        let transport = MockTransport::new();

        let client = ApiClient::new(
            Arc::new(transport),
            Arc::new(authorization),
            instant_retries(5),
        );
        let error = client.get("http://unit.test/imodels", None).await.unwrap_err();

        assert!(error.downcast_ref::<ApiError>().is_none());
        assert!(error.to_string().contains("token acquisition failed"));
    }

    #[tokio::test]
    async fn test_delete_with_empty_response() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/imodels/1")
            .with_status(204)
            .create_async()
            .await;

        let client = reqwest_client(None);
        let response = client
            .delete(&format!("{}/imodels/1", server.url()))
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(response.body.is_none());
    }
}
