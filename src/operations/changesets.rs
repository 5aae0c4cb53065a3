//! Changeset operations.

use std::sync::Arc;

use anyhow::{Context, Result};
use log::debug;
use serde_json::Value;

use crate::http::{ApiClient, ReturnPrefer};
use crate::paging::{EntityListIterator, PageQuery};

use super::ListOptions;

/// Wire shapes of changeset responses (internal).
mod api {
    use serde::Deserialize;

    #[derive(Deserialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct Changeset {
        pub id: String,
        pub display_name: Option<String>,
        pub description: Option<String>,
        pub index: i64,
        pub parent_id: Option<String>,
        pub briefcase_id: Option<i64>,
        pub pushed_date_time: Option<String>,
        pub file_size: Option<u64>,
    }
}

/// One changeset of an iModel's timeline.
#[derive(Debug, Clone)]
pub struct Changeset {
    pub id: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    /// Position in the iModel's timeline, assigned by the server.
    pub index: i64,
    pub parent_id: Option<String>,
    pub briefcase_id: Option<i64>,
    pub pushed_date_time: Option<String>,
    pub file_size: Option<u64>,
}

impl From<api::Changeset> for Changeset {
    fn from(wire: api::Changeset) -> Self {
        Changeset {
            id: wire.id,
            display_name: wire.display_name,
            description: wire.description,
            index: wire.index,
            parent_id: wire.parent_id,
            briefcase_id: wire.briefcase_id,
            pushed_date_time: wire.pushed_date_time,
            file_size: wire.file_size,
        }
    }
}

/// Operations on an iModel's changesets.
pub struct ChangesetOperations {
    client: Arc<ApiClient>,
    api_url: String,
}

impl ChangesetOperations {
    pub(crate) fn new(client: Arc<ApiClient>, api_url: String) -> Self {
        Self { client, api_url }
    }

    /// List the changesets of an iModel in timeline order.
    pub fn list(&self, imodel_id: &str, options: ListOptions) -> EntityListIterator<Changeset> {
        debug!("Listing changesets of iModel {}...", imodel_id);

        let mut url = format!("{}/imodels/{}/changesets", self.api_url, imodel_id);
        if let Some(top) = options.top {
            url.push_str(&format!("?$top={}", top));
        }

        EntityListIterator::new(PageQuery::new(
            Arc::clone(&self.client),
            url,
            Some(ReturnPrefer::Representation),
            extract_changesets,
        ))
    }

    /// Get one changeset by id or timeline index.
    pub async fn get(&self, imodel_id: &str, changeset_index_or_id: &str) -> Result<Changeset> {
        let url = format!(
            "{}/imodels/{}/changesets/{}",
            self.api_url, imodel_id, changeset_index_or_id
        );
        debug!("Fetching changeset {} of iModel {}...", changeset_index_or_id, imodel_id);

        let response = self.client.get(&url, None).await?;
        let body = response.body.context("Response had no body")?;
        let entity = body
            .get("changeset")
            .cloned()
            .context("Response had no changeset property")?;
        let wire: api::Changeset =
            serde_json::from_value(entity).context("Failed to parse changeset")?;
        Ok(wire.into())
    }
}

fn extract_changesets(body: &Value) -> Result<Vec<Changeset>> {
    let collection = body
        .get("changesets")
        .cloned()
        .context("Response had no changesets property")?;
    let wire: Vec<api::Changeset> =
        serde_json::from_value(collection).context("Failed to parse changesets collection")?;
    Ok(wire.into_iter().map(Changeset::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::api_client;
    use serde_json::json;

    fn operations(server: &mockito::ServerGuard) -> ChangesetOperations {
        ChangesetOperations::new(api_client(), server.url())
    }

    fn changeset_body(id: &str, index: i64) -> Value {
        json!({
            "id": id,
            "displayName": format!("{}", index),
            "description": "fix",
            "index": index,
            "parentId": null,
            "briefcaseId": 2,
            "pushedDateTime": "2024-03-01T10:00:00Z",
            "fileSize": 1024
        })
    }

    #[tokio::test]
    async fn test_list_follows_pages_in_timeline_order() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();
        let _first = server
            .mock("GET", "/imodels/im-1/changesets")
            .with_status(200)
            .with_body(
                json!({
                    "changesets": [changeset_body("cs-1", 1), changeset_body("cs-2", 2)],
                    "_links": {"next": {"href": format!("{}/imodels/im-1/changesets?$skip=2", url)}}
                })
                .to_string(),
            )
            .create_async()
            .await;
        let _second = server
            .mock("GET", "/imodels/im-1/changesets?$skip=2")
            .with_status(200)
            .with_body(json!({"changesets": [changeset_body("cs-3", 3)]}).to_string())
            .create_async()
            .await;

        let changesets = operations(&server)
            .list("im-1", ListOptions::default())
            .collect_all()
            .await
            .unwrap();

        let indexes: Vec<i64> = changesets.iter().map(|c| c.index).collect();
        assert_eq!(indexes, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_get_by_index() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/imodels/im-1/changesets/2")
            .with_status(200)
            .with_body(json!({"changeset": changeset_body("cs-2", 2)}).to_string())
            .create_async()
            .await;

        let changeset = operations(&server).get("im-1", "2").await.unwrap();

        mock.assert_async().await;
        assert_eq!(changeset.id, "cs-2");
        assert_eq!(changeset.briefcase_id, Some(2));
    }
}
