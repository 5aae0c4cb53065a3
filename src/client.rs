//! Client facade: configuration and operation group accessors.

use std::sync::Arc;

use reqwest::Client;

use crate::auth::AuthorizationProvider;
use crate::http::{ApiClient, ExponentialBackoff, ReqwestTransport, RetryPolicy, Transport};
use crate::operations::{
    BriefcaseOperations, ChangesetOperations, IModelOperations, NamedVersionOperations,
};

/// Default API base URL. Operation groups append their resource paths
/// ("/imodels", ...) to it.
pub const DEFAULT_API_URL: &str = "https://api.bentley.com";

/// Configuration for [`IModelsClient`], threaded through the constructor.
pub struct IModelsClientOptions {
    /// API base URL.
    pub api_url: String,
    /// Retry policy applied to every request; `None` disables retries.
    pub retry_policy: Option<Arc<dyn RetryPolicy>>,
}

impl Default for IModelsClientOptions {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            retry_policy: Some(Arc::new(ExponentialBackoff::default())),
        }
    }
}

/// Entry point to the iModels API.
pub struct IModelsClient {
    client: Arc<ApiClient>,
    api_url: String,
}

impl IModelsClient {
    /// Create a client with the default reqwest transport.
    pub fn new(
        authorization: Arc<dyn AuthorizationProvider>,
        options: IModelsClientOptions,
    ) -> Self {
        let transport = Arc::new(ReqwestTransport::new(Client::new()));
        Self::with_transport(transport, authorization, options)
    }

    /// Create a client over an injected transport.
    pub fn with_transport(
        transport: Arc<dyn Transport>,
        authorization: Arc<dyn AuthorizationProvider>,
        options: IModelsClientOptions,
    ) -> Self {
        Self {
            client: Arc::new(ApiClient::new(
                transport,
                authorization,
                options.retry_policy,
            )),
            api_url: options.api_url,
        }
    }

    /// API base URL this client talks to.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// iModel operations.
    pub fn imodels(&self) -> IModelOperations {
        IModelOperations::new(Arc::clone(&self.client), self.api_url.clone())
    }

    /// Briefcase operations.
    pub fn briefcases(&self) -> BriefcaseOperations {
        BriefcaseOperations::new(Arc::clone(&self.client), self.api_url.clone())
    }

    /// Changeset operations.
    pub fn changesets(&self) -> ChangesetOperations {
        ChangesetOperations::new(Arc::clone(&self.client), self.api_url.clone())
    }

    /// Named version operations.
    pub fn named_versions(&self) -> NamedVersionOperations {
        NamedVersionOperations::new(Arc::clone(&self.client), self.api_url.clone())
    }
}
