//! Named version operations.

use std::sync::Arc;

use anyhow::{Context, Result};
use log::debug;
use serde_json::{json, Value};

use crate::http::{ApiClient, ReturnPrefer};
use crate::paging::{EntityListIterator, PageQuery};

use super::ListOptions;

/// Wire shapes of named version responses (internal).
mod api {
    use serde::Deserialize;

    #[derive(Deserialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct NamedVersion {
        pub id: String,
        pub display_name: Option<String>,
        pub name: String,
        pub description: Option<String>,
        pub changeset_id: Option<String>,
        pub created_date_time: Option<String>,
        pub state: Option<String>,
    }
}

/// Visibility state of a named version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedVersionState {
    Visible,
    Hidden,
}

/// A named version: a labeled point on an iModel's changeset timeline.
#[derive(Debug, Clone)]
pub struct NamedVersion {
    pub id: String,
    pub display_name: Option<String>,
    pub name: String,
    pub description: Option<String>,
    /// Changeset the version points at; absent for the baseline.
    pub changeset_id: Option<String>,
    pub created_date_time: Option<String>,
    pub state: NamedVersionState,
}

impl From<api::NamedVersion> for NamedVersion {
    fn from(wire: api::NamedVersion) -> Self {
        NamedVersion {
            id: wire.id,
            display_name: wire.display_name,
            name: wire.name,
            description: wire.description,
            changeset_id: wire.changeset_id,
            created_date_time: wire.created_date_time,
            state: match wire.state.as_deref() {
                Some("hidden") => NamedVersionState::Hidden,
                _ => NamedVersionState::Visible,
            },
        }
    }
}

/// Parameters for creating a named version.
#[derive(Debug, Clone)]
pub struct CreateNamedVersionParams {
    pub name: String,
    pub description: Option<String>,
    /// Changeset to label; absent labels the baseline.
    pub changeset_id: Option<String>,
}

/// Parameters for updating a named version. Absent fields stay unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateNamedVersionParams {
    pub name: Option<String>,
    pub description: Option<String>,
    pub state: Option<NamedVersionState>,
}

/// Operations on an iModel's named versions.
pub struct NamedVersionOperations {
    client: Arc<ApiClient>,
    api_url: String,
}

impl NamedVersionOperations {
    pub(crate) fn new(client: Arc<ApiClient>, api_url: String) -> Self {
        Self { client, api_url }
    }

    /// List the named versions of an iModel.
    pub fn list(&self, imodel_id: &str, options: ListOptions) -> EntityListIterator<NamedVersion> {
        debug!("Listing named versions of iModel {}...", imodel_id);

        let mut url = format!("{}/imodels/{}/namedversions", self.api_url, imodel_id);
        if let Some(top) = options.top {
            url.push_str(&format!("?$top={}", top));
        }

        EntityListIterator::new(PageQuery::new(
            Arc::clone(&self.client),
            url,
            Some(ReturnPrefer::Representation),
            extract_named_versions,
        ))
    }

    /// Get one named version by id.
    pub async fn get(&self, imodel_id: &str, named_version_id: &str) -> Result<NamedVersion> {
        let url = format!(
            "{}/imodels/{}/namedversions/{}",
            self.api_url, imodel_id, named_version_id
        );
        debug!("Fetching named version {} of iModel {}...", named_version_id, imodel_id);

        let response = self.client.get(&url, None).await?;
        single_named_version(response.body)
    }

    /// Create a named version.
    pub async fn create(
        &self,
        imodel_id: &str,
        params: CreateNamedVersionParams,
    ) -> Result<NamedVersion> {
        let url = format!("{}/imodels/{}/namedversions", self.api_url, imodel_id);
        debug!("Creating named version {} on iModel {}...", params.name, imodel_id);

        let mut body = json!({"name": params.name});
        if let Some(description) = params.description {
            body["description"] = json!(description);
        }
        if let Some(changeset_id) = params.changeset_id {
            body["changesetId"] = json!(changeset_id);
        }

        let response = self.client.post(&url, &body).await?;
        single_named_version(response.body)
    }

    /// Update a named version's properties or visibility.
    pub async fn update(
        &self,
        imodel_id: &str,
        named_version_id: &str,
        params: UpdateNamedVersionParams,
    ) -> Result<NamedVersion> {
        let url = format!(
            "{}/imodels/{}/namedversions/{}",
            self.api_url, imodel_id, named_version_id
        );
        debug!("Updating named version {} of iModel {}...", named_version_id, imodel_id);

        let mut body = json!({});
        if let Some(name) = params.name {
            body["name"] = json!(name);
        }
        if let Some(description) = params.description {
            body["description"] = json!(description);
        }
        if let Some(state) = params.state {
            body["state"] = json!(match state {
                NamedVersionState::Visible => "visible",
                NamedVersionState::Hidden => "hidden",
            });
        }

        let response = self.client.patch(&url, &body).await?;
        single_named_version(response.body)
    }
}

fn extract_named_versions(body: &Value) -> Result<Vec<NamedVersion>> {
    let collection = body
        .get("namedVersions")
        .cloned()
        .context("Response had no namedVersions property")?;
    let wire: Vec<api::NamedVersion> =
        serde_json::from_value(collection).context("Failed to parse namedVersions collection")?;
    Ok(wire.into_iter().map(NamedVersion::from).collect())
}

fn single_named_version(body: Option<Value>) -> Result<NamedVersion> {
    let body = body.context("Response had no body")?;
    let entity = body
        .get("namedVersion")
        .cloned()
        .context("Response had no namedVersion property")?;
    let wire: api::NamedVersion =
        serde_json::from_value(entity).context("Failed to parse namedVersion")?;
    Ok(wire.into())
}
