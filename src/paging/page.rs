//! Single-page fetching over collection URLs.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::http::{ApiClient, ReturnPrefer};

/// Extracts entities from a collection response body.
///
/// The collection property name varies per entity type ("iModels",
/// "changesets", ...), so every operation supplies its own extractor.
pub type EntityExtractor<T> = fn(&Value) -> Result<Vec<T>>;

/// Everything needed to fetch one page of a collection.
///
/// Captured explicitly at construction: the shared client, the absolute URL,
/// the representation depth and the extractor. A continuation is just another
/// `PageQuery` with the URL swapped for the server's `next` link.
pub struct PageQuery<T> {
    client: Arc<ApiClient>,
    url: String,
    prefer: Option<ReturnPrefer>,
    extract: EntityExtractor<T>,
}

impl<T> PageQuery<T> {
    /// Create a query for the first page of a collection.
    pub fn new(
        client: Arc<ApiClient>,
        url: String,
        prefer: Option<ReturnPrefer>,
        extract: EntityExtractor<T>,
    ) -> Self {
        Self {
            client,
            url,
            prefer,
            extract,
        }
    }

    /// Fetch this page.
    ///
    /// Retry and classification happen in the execution layer; errors
    /// propagate untouched.
    pub async fn fetch(&self) -> Result<Page<T>> {
        let response = self.client.get(&self.url, self.prefer).await?;
        let body = response
            .body
            .context("Collection response had no body")?;

        let entities = (self.extract)(&body)?;
        let next = next_link(&body).map(|href| PageQuery {
            client: Arc::clone(&self.client),
            url: href,
            prefer: self.prefer,
            extract: self.extract,
        });

        Ok(Page { entities, next })
    }
}

/// One server-returned batch of a collection, in server order.
pub struct Page<T> {
    /// Entities of this page, order preserved from the response.
    pub entities: Vec<T>,
    /// Query for the following page; `None` exactly when the server said
    /// this was the last one.
    pub next: Option<PageQuery<T>>,
}

impl<T: std::fmt::Debug> std::fmt::Debug for Page<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("entities", &self.entities)
            .field("has_next", &self.next.is_some())
            .finish()
    }
}

/// Pull `_links.next.href` out of a collection body. Absent or null means
/// last page.
fn next_link(body: &Value) -> Option<String> {
    body.get("_links")?
        .get("next")?
        .get("href")?
        .as_str()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::api_client;
    use serde_json::json;

    fn extract_names(body: &Value) -> Result<Vec<String>> {
        let names = body
            .get("names")
            .and_then(Value::as_array)
            .context("missing collection property")?;
        names
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .context("entity was not a string")
            })
            .collect()
    }

    #[test]
    fn test_next_link_extraction() {
        let body = json!({"_links": {"next": {"href": "https://host/page2"}}});
        assert_eq!(next_link(&body).as_deref(), Some("https://host/page2"));

        assert_eq!(next_link(&json!({"_links": {"next": null}})), None);
        assert_eq!(next_link(&json!({"_links": {}})), None);
        assert_eq!(next_link(&json!({})), None);
    }

    #[tokio::test]
    async fn test_fetch_page_with_continuation() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();
        let _m = server
            .mock("GET", "/things")
            .with_status(200)
            .with_body(
                json!({
                    "names": ["a", "b"],
                    "_links": {"next": {"href": format!("{}/things?page=2", url)}}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let query = PageQuery::new(
            api_client(),
            format!("{}/things", url),
            None,
            extract_names,
        );
        let page = query.fetch().await.unwrap();

        assert_eq!(page.entities, vec!["a", "b"]);
        assert!(page.next.is_some());
    }

    #[tokio::test]
    async fn test_fetch_last_page_has_no_continuation() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/things")
            .with_status(200)
            .with_body(json!({"names": ["c"], "_links": {"self": {"href": "x"}}}).to_string())
            .create_async()
            .await;

        let query = PageQuery::new(
            api_client(),
            format!("{}/things", server.url()),
            None,
            extract_names,
        );
        let page = query.fetch().await.unwrap();

        assert_eq!(page.entities, vec!["c"]);
        assert!(page.next.is_none());
    }

    #[tokio::test]
    async fn test_fetch_propagates_classified_errors() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/things")
            .with_status(404)
            .with_body(r#"{"error":{"code":"iModelNotFound","message":"gone"}}"#)
            .create_async()
            .await;

        let query = PageQuery::new(
            api_client(),
            format!("{}/things", server.url()),
            None,
            extract_names,
        );
        let error = query.fetch().await.unwrap_err();

        use crate::error::{ApiError, ApiErrorCode};
        let api_error = error.downcast_ref::<ApiError>().unwrap();
        assert_eq!(api_error.code, ApiErrorCode::IModelNotFound);
    }
}
