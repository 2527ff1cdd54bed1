//! # Catalog Client
//!
//! [`CatalogApi`] is the capability the rest of the crate talks to.
//! [`HttpCatalogClient`] implements it over HTTP with `reqwest`.
//!
//! ## Endpoints
//!
//! | Operation | Request |
//! |-----------|---------|
//! | `list_items` | `GET /items?page&limit&excludeSelected&filterId` |
//! | `list_selected` | `GET /items/selected?page&limit&filterId` |
//! | `add_item` | `POST /items {id}` |
//! | `select` / `deselect` | `PUT /items/selected {action, id}` |
//! | `reorder` | `PUT /items/selected {action: "reorder", order}` |
//! | `fetch_order` | `GET /items/state` |

use super::error::ApiError;
use super::model::{
    ErrorBody, ItemId, ItemsPage, NewItem, OrderSnapshot, PageQuery, SelectedPage,
    SelectionCommand,
};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Paginated CRUD operations against the item catalog
#[async_trait]
pub trait CatalogApi: Send + Sync + 'static {
    /// Catalog page. With `exclude_selected`, ids already selected are left out.
    async fn list_items(&self, query: &PageQuery, exclude_selected: bool)
        -> Result<ItemsPage, ApiError>;

    /// Selected-list page, in canonical order, plus the full order.
    async fn list_selected(&self, query: &PageQuery) -> Result<SelectedPage, ApiError>;

    async fn add_item(&self, id: ItemId) -> Result<(), ApiError>;

    async fn select(&self, id: ItemId) -> Result<(), ApiError>;

    async fn deselect(&self, id: ItemId) -> Result<(), ApiError>;

    /// Replace the canonical order wholesale.
    async fn reorder(&self, order: &[ItemId]) -> Result<(), ApiError>;

    /// Full canonical order, independent of any filter or page.
    async fn fetch_order(&self) -> Result<OrderSnapshot, ApiError>;
}

/// [`CatalogApi`] over HTTP
#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    client: Client,
    base_url: String,
}

impl HttpCatalogClient {
    /// `base_url` is the API root; `/items` is appended to it.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/items{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: String,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        debug!(%url, ?params, "GET");
        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                url: url.clone(),
                source,
            })?;
        let response = check_status(url.clone(), response).await?;
        response
            .json::<T>()
            .await
            .map_err(|source| ApiError::Decode { url, source })
    }

    async fn send_json<B: serde::Serialize + ?Sized>(
        &self,
        method: reqwest::Method,
        url: String,
        body: &B,
    ) -> Result<(), ApiError> {
        debug!(%url, %method, "sending mutation");
        let response = self
            .client
            .request(method, &url)
            .json(body)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                url: url.clone(),
                source,
            })?;
        check_status(url, response).await?;
        Ok(())
    }

    async fn put_selection(&self, command: &SelectionCommand) -> Result<(), ApiError> {
        self.send_json(reqwest::Method::PUT, self.url("/selected"), command)
            .await
    }
}

/// Turn a non-2xx response into [`ApiError::Status`], preferring the
/// server's `{error}` message when the body carries one.
async fn check_status(url: String, response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or_else(|_| {
            if text.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                text
            }
        });

    Err(ApiError::Status {
        url,
        status,
        message,
    })
}

fn page_params(query: &PageQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("page", query.page.to_string()),
        ("limit", query.limit.to_string()),
    ];
    if let Some(filter) = query.filter.as_deref().filter(|f| !f.is_empty()) {
        params.push(("filterId", filter.to_string()));
    }
    params
}

#[async_trait]
impl CatalogApi for HttpCatalogClient {
    async fn list_items(
        &self,
        query: &PageQuery,
        exclude_selected: bool,
    ) -> Result<ItemsPage, ApiError> {
        let mut params = page_params(query);
        params.push(("excludeSelected", exclude_selected.to_string()));
        self.get_json(self.url(""), &params).await
    }

    async fn list_selected(&self, query: &PageQuery) -> Result<SelectedPage, ApiError> {
        self.get_json(self.url("/selected"), &page_params(query))
            .await
    }

    async fn add_item(&self, id: ItemId) -> Result<(), ApiError> {
        self.send_json(reqwest::Method::POST, self.url(""), &NewItem { id })
            .await
    }

    async fn select(&self, id: ItemId) -> Result<(), ApiError> {
        self.put_selection(&SelectionCommand::Select { id }).await
    }

    async fn deselect(&self, id: ItemId) -> Result<(), ApiError> {
        self.put_selection(&SelectionCommand::Deselect { id }).await
    }

    async fn reorder(&self, order: &[ItemId]) -> Result<(), ApiError> {
        self.put_selection(&SelectionCommand::Reorder {
            order: order.to_vec(),
        })
        .await
    }

    async fn fetch_order(&self) -> Result<OrderSnapshot, ApiError> {
        self.get_json(self.url("/state"), &[]).await
    }
}
