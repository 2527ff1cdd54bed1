//! Page sources: the one thing that differs between the two panes' loading.

use crate::api::{ApiError, CatalogApi, Item, ItemId, PageQuery};
use async_trait::async_trait;
use std::sync::Arc;

/// A page as seen by a pane, regardless of which endpoint produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub items: Vec<Item>,
    pub total: u64,
    pub page: u32,
    pub has_more: bool,
    /// Full canonical order, reported only by the selected-list endpoint
    pub order: Option<Vec<ItemId>>,
}

/// Fetches one page for a pane
#[async_trait]
pub trait PageSource: Send + Sync + 'static {
    async fn fetch_page(&self, query: &PageQuery) -> Result<Page, ApiError>;

    /// Whether an item handed to the other pane also leaves this listing on
    /// the server, moving every later item one slot earlier.
    fn hand_off_shifts_pages(&self) -> bool {
        true
    }
}

/// Catalog pages for the Available pane
pub struct CatalogSource {
    api: Arc<dyn CatalogApi>,
    exclude_selected: bool,
}

impl CatalogSource {
    pub fn new(api: Arc<dyn CatalogApi>, exclude_selected: bool) -> Self {
        Self {
            api,
            exclude_selected,
        }
    }
}

#[async_trait]
impl PageSource for CatalogSource {
    async fn fetch_page(&self, query: &PageQuery) -> Result<Page, ApiError> {
        let page = self.api.list_items(query, self.exclude_selected).await?;
        Ok(Page {
            has_more: page.has_more(),
            items: page.items,
            total: page.total,
            page: page.page,
            order: None,
        })
    }

    fn hand_off_shifts_pages(&self) -> bool {
        self.exclude_selected
    }
}

/// Selected-list pages for the Selected pane
pub struct SelectionSource {
    api: Arc<dyn CatalogApi>,
}

impl SelectionSource {
    pub fn new(api: Arc<dyn CatalogApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl PageSource for SelectionSource {
    async fn fetch_page(&self, query: &PageQuery) -> Result<Page, ApiError> {
        let page = self.api.list_selected(query).await?;
        Ok(Page {
            has_more: page.has_more(),
            items: page.items,
            total: page.total,
            page: page.page,
            order: Some(page.order),
        })
    }
}
