//! Briefcase operations.

use std::sync::Arc;

use anyhow::{Context, Result};
use log::debug;
use serde_json::{json, Value};

use crate::http::{ApiClient, ReturnPrefer};
use crate::paging::{EntityListIterator, PageQuery};

use super::ListOptions;

/// Wire shapes of briefcase responses (internal).
mod api {
    use serde::Deserialize;

    #[derive(Deserialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct Briefcase {
        pub briefcase_id: i64,
        pub display_name: Option<String>,
        pub owner_id: Option<String>,
        pub device_name: Option<String>,
        pub acquired_date_time: Option<String>,
        pub file_size: Option<u64>,
    }
}

/// A briefcase: one writer's registered copy of an iModel.
#[derive(Debug, Clone)]
pub struct Briefcase {
    pub briefcase_id: i64,
    pub display_name: Option<String>,
    pub owner_id: Option<String>,
    pub device_name: Option<String>,
    pub acquired_date_time: Option<String>,
    pub file_size: Option<u64>,
}

impl From<api::Briefcase> for Briefcase {
    fn from(wire: api::Briefcase) -> Self {
        Briefcase {
            briefcase_id: wire.briefcase_id,
            display_name: wire.display_name,
            owner_id: wire.owner_id,
            device_name: wire.device_name,
            acquired_date_time: wire.acquired_date_time,
            file_size: wire.file_size,
        }
    }
}

/// Parameters for acquiring a briefcase.
#[derive(Debug, Clone, Default)]
pub struct AcquireBriefcaseParams {
    pub device_name: Option<String>,
}

/// Operations on an iModel's briefcases.
pub struct BriefcaseOperations {
    client: Arc<ApiClient>,
    api_url: String,
}

impl BriefcaseOperations {
    pub(crate) fn new(client: Arc<ApiClient>, api_url: String) -> Self {
        Self { client, api_url }
    }

    /// List the briefcases of an iModel.
    pub fn list(&self, imodel_id: &str, options: ListOptions) -> EntityListIterator<Briefcase> {
        debug!("Listing briefcases of iModel {}...", imodel_id);

        let mut url = format!("{}/imodels/{}/briefcases", self.api_url, imodel_id);
        if let Some(top) = options.top {
            url.push_str(&format!("?$top={}", top));
        }

        EntityListIterator::new(PageQuery::new(
            Arc::clone(&self.client),
            url,
            Some(ReturnPrefer::Representation),
            extract_briefcases,
        ))
    }

    /// Get one briefcase by id.
    pub async fn get(&self, imodel_id: &str, briefcase_id: i64) -> Result<Briefcase> {
        let url = format!(
            "{}/imodels/{}/briefcases/{}",
            self.api_url, imodel_id, briefcase_id
        );
        debug!("Fetching briefcase {} of iModel {}...", briefcase_id, imodel_id);

        let response = self.client.get(&url, None).await?;
        single_briefcase(response.body)
    }

    /// Acquire a new briefcase of an iModel.
    pub async fn acquire(
        &self,
        imodel_id: &str,
        params: AcquireBriefcaseParams,
    ) -> Result<Briefcase> {
        let url = format!("{}/imodels/{}/briefcases", self.api_url, imodel_id);
        debug!("Acquiring briefcase of iModel {}...", imodel_id);

        let mut body = json!({});
        if let Some(device_name) = params.device_name {
            body["deviceName"] = json!(device_name);
        }

        let response = self.client.post(&url, &body).await?;
        single_briefcase(response.body)
    }

    /// Release a briefcase.
    pub async fn release(&self, imodel_id: &str, briefcase_id: i64) -> Result<()> {
        let url = format!(
            "{}/imodels/{}/briefcases/{}",
            self.api_url, imodel_id, briefcase_id
        );
        debug!("Releasing briefcase {} of iModel {}...", briefcase_id, imodel_id);

        self.client.delete(&url).await?;
        Ok(())
    }
}

fn extract_briefcases(body: &Value) -> Result<Vec<Briefcase>> {
    let collection = body
        .get("briefcases")
        .cloned()
        .context("Response had no briefcases property")?;
    let wire: Vec<api::Briefcase> =
        serde_json::from_value(collection).context("Failed to parse briefcases collection")?;
    Ok(wire.into_iter().map(Briefcase::from).collect())
}

fn single_briefcase(body: Option<Value>) -> Result<Briefcase> {
    let body = body.context("Response had no body")?;
    let entity = body
        .get("briefcase")
        .cloned()
        .context("Response had no briefcase property")?;
    let wire: api::Briefcase =
        serde_json::from_value(entity).context("Failed to parse briefcase")?;
    Ok(wire.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::api_client;
    use serde_json::json;

    fn operations(server: &mockito::ServerGuard) -> BriefcaseOperations {
        BriefcaseOperations::new(api_client(), server.url())
    }

    fn briefcase_body(id: i64) -> Value {
        json!({
            "briefcaseId": id,
            "displayName": format!("{}", id),
            "ownerId": "user-1",
            "deviceName": "workstation",
            "acquiredDateTime": "2024-02-01T12:00:00Z",
            "fileSize": 2048
        })
    }

    #[tokio::test]
    async fn test_acquire_and_release() {
        let mut server = mockito::Server::new_async().await;
        let acquire_mock = server
            .mock("POST", "/imodels/im-1/briefcases")
            .match_body(mockito::Matcher::Json(json!({"deviceName": "workstation"})))
            .with_status(201)
            .with_body(json!({"briefcase": briefcase_body(7)}).to_string())
            .create_async()
            .await;
        let release_mock = server
            .mock("DELETE", "/imodels/im-1/briefcases/7")
            .with_status(204)
            .create_async()
            .await;

        let operations = operations(&server);
        let briefcase = operations
            .acquire(
                "im-1",
                AcquireBriefcaseParams {
                    device_name: Some("workstation".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(briefcase.briefcase_id, 7);

        operations.release("im-1", 7).await.unwrap();

        acquire_mock.assert_async().await;
        release_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_list() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/imodels/im-1/briefcases?$top=2")
            .with_status(200)
            .with_body(
                json!({"briefcases": [briefcase_body(1), briefcase_body(2)]}).to_string(),
            )
            .create_async()
            .await;

        let briefcases = operations(&server)
            .list("im-1", ListOptions { top: Some(2) })
            .collect_all()
            .await
            .unwrap();

        assert_eq!(briefcases.len(), 2);
        assert_eq!(briefcases[0].owner_id.as_deref(), Some("user-1"));
    }

    #[tokio::test]
    async fn test_get() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/imodels/im-1/briefcases/7")
            .with_status(200)
            .with_body(json!({"briefcase": briefcase_body(7)}).to_string())
            .create_async()
            .await;

        let briefcase = operations(&server).get("im-1", 7).await.unwrap();
        assert_eq!(briefcase.device_name.as_deref(), Some("workstation"));
    }
}
