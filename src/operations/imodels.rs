//! iModel operations.

use std::sync::Arc;

use anyhow::{Context, Result};
use log::debug;
use serde_json::{json, Value};

use crate::http::{ApiClient, ReturnPrefer};
use crate::paging::{EntityListIterator, PageQuery};

use super::ListOptions;

/// Wire shapes of iModel responses (internal).
mod api {
    use serde::Deserialize;

    #[derive(Deserialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct IModel {
        pub id: String,
        pub display_name: Option<String>,
        pub name: String,
        pub description: Option<String>,
        pub state: String,
        pub created_date_time: Option<String>,
        #[serde(rename = "iTwinId")]
        pub itwin_id: Option<String>,
    }

    #[derive(Deserialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct MinimalIModel {
        pub id: String,
        pub display_name: Option<String>,
    }
}

/// Lifecycle state of an iModel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IModelState {
    Initialized,
    NotInitialized,
}

/// An iModel in full representation.
#[derive(Debug, Clone)]
pub struct IModel {
    pub id: String,
    pub display_name: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub state: IModelState,
    pub created_date_time: Option<String>,
    pub itwin_id: Option<String>,
}

/// An iModel in minimal representation.
#[derive(Debug, Clone)]
pub struct MinimalIModel {
    pub id: String,
    pub display_name: Option<String>,
}

impl From<api::IModel> for IModel {
    fn from(wire: api::IModel) -> Self {
        IModel {
            id: wire.id,
            display_name: wire.display_name,
            name: wire.name,
            description: wire.description,
            state: match wire.state.as_str() {
                "initialized" => IModelState::Initialized,
                _ => IModelState::NotInitialized,
            },
            created_date_time: wire.created_date_time,
            itwin_id: wire.itwin_id,
        }
    }
}

impl From<api::MinimalIModel> for MinimalIModel {
    fn from(wire: api::MinimalIModel) -> Self {
        MinimalIModel {
            id: wire.id,
            display_name: wire.display_name,
        }
    }
}

/// Parameters for creating an iModel.
#[derive(Debug, Clone)]
pub struct CreateIModelParams {
    pub itwin_id: String,
    pub name: String,
    pub description: Option<String>,
}

/// Parameters for updating an iModel. Absent fields stay unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateIModelParams {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Operations on the iModels collection.
pub struct IModelOperations {
    client: Arc<ApiClient>,
    api_url: String,
}

impl IModelOperations {
    pub(crate) fn new(client: Arc<ApiClient>, api_url: String) -> Self {
        Self { client, api_url }
    }

    /// List the iModels of an iTwin in full representation.
    pub fn list(&self, itwin_id: &str, options: ListOptions) -> EntityListIterator<IModel> {
        debug!("Listing iModels for iTwin {}...", itwin_id);

        EntityListIterator::new(PageQuery::new(
            Arc::clone(&self.client),
            self.list_url(itwin_id, &options),
            Some(ReturnPrefer::Representation),
            extract_imodels,
        ))
    }

    /// List the iModels of an iTwin in minimal representation.
    pub fn list_minimal(
        &self,
        itwin_id: &str,
        options: ListOptions,
    ) -> EntityListIterator<MinimalIModel> {
        debug!("Listing minimal iModels for iTwin {}...", itwin_id);

        EntityListIterator::new(PageQuery::new(
            Arc::clone(&self.client),
            self.list_url(itwin_id, &options),
            Some(ReturnPrefer::Minimal),
            extract_minimal_imodels,
        ))
    }

    /// Get one iModel by id.
    pub async fn get(&self, imodel_id: &str) -> Result<IModel> {
        let url = format!("{}/imodels/{}", self.api_url, imodel_id);
        debug!("Fetching iModel {}...", imodel_id);

        let response = self.client.get(&url, None).await?;
        single_imodel(response.body)
    }

    /// Create an iModel.
    pub async fn create(&self, params: CreateIModelParams) -> Result<IModel> {
        let url = format!("{}/imodels", self.api_url);
        debug!("Creating iModel {} in iTwin {}...", params.name, params.itwin_id);

        let mut body = json!({
            "iTwinId": params.itwin_id,
            "name": params.name,
        });
        if let Some(description) = params.description {
            body["description"] = json!(description);
        }

        let response = self.client.post(&url, &body).await?;
        single_imodel(response.body)
    }

    /// Update an iModel's properties.
    pub async fn update(&self, imodel_id: &str, params: UpdateIModelParams) -> Result<IModel> {
        let url = format!("{}/imodels/{}", self.api_url, imodel_id);
        debug!("Updating iModel {}...", imodel_id);

        let mut body = json!({});
        if let Some(name) = params.name {
            body["name"] = json!(name);
        }
        if let Some(description) = params.description {
            body["description"] = json!(description);
        }

        let response = self.client.patch(&url, &body).await?;
        single_imodel(response.body)
    }

    /// Delete an iModel.
    pub async fn delete(&self, imodel_id: &str) -> Result<()> {
        let url = format!("{}/imodels/{}", self.api_url, imodel_id);
        debug!("Deleting iModel {}...", imodel_id);

        self.client.delete(&url).await?;
        Ok(())
    }

    fn list_url(&self, itwin_id: &str, options: &ListOptions) -> String {
        let mut url = format!("{}/imodels?iTwinId={}", self.api_url, itwin_id);
        if let Some(top) = options.top {
            url.push_str(&format!("&$top={}", top));
        }
        url
    }
}

fn extract_imodels(body: &Value) -> Result<Vec<IModel>> {
    let collection = body
        .get("iModels")
        .cloned()
        .context("Response had no iModels property")?;
    let wire: Vec<api::IModel> =
        serde_json::from_value(collection).context("Failed to parse iModels collection")?;
    Ok(wire.into_iter().map(IModel::from).collect())
}

fn extract_minimal_imodels(body: &Value) -> Result<Vec<MinimalIModel>> {
    let collection = body
        .get("iModels")
        .cloned()
        .context("Response had no iModels property")?;
    let wire: Vec<api::MinimalIModel> =
        serde_json::from_value(collection).context("Failed to parse iModels collection")?;
    Ok(wire.into_iter().map(MinimalIModel::from).collect())
}

fn single_imodel(body: Option<Value>) -> Result<IModel> {
    let body = body.context("Response had no body")?;
    let entity = body
        .get("iModel")
        .cloned()
        .context("Response had no iModel property")?;
    let wire: api::IModel = serde_json::from_value(entity).context("Failed to parse iModel")?;
    Ok(wire.into())
}
