//! # Wire Model
//!
//! Typed request and response bodies for the catalog API. Field names follow
//! the API's camelCase JSON; Rust-side names are snake_case.

use serde::{Deserialize, Serialize};

/// Catalog item identifier. Always positive.
pub type ItemId = u64;

/// A catalog entry. Identity is the id; items never change once fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
}

impl Item {
    pub fn new(id: ItemId) -> Self {
        Self { id }
    }
}

/// Query parameters shared by both list endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub page: u32,
    pub limit: u32,
    pub filter: Option<String>,
}

/// One page of the catalog (`GET /items`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemsPage {
    pub items: Vec<Item>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    /// Some servers omit this; see [`ItemsPage::has_more`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_more: Option<bool>,
}

impl ItemsPage {
    /// Whether more items exist past this page for the same filter.
    ///
    /// Falls back to `page * limit < total` when the server did not say.
    pub fn has_more(&self) -> bool {
        self.has_more
            .unwrap_or_else(|| derive_has_more(self.page, self.limit, self.total))
    }
}

/// One page of the selected list plus the full canonical order
/// (`GET /items/selected`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedPage {
    pub items: Vec<Item>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_more: Option<bool>,
    #[serde(default)]
    pub order: Vec<ItemId>,
}

impl SelectedPage {
    pub fn has_more(&self) -> bool {
        self.has_more
            .unwrap_or_else(|| derive_has_more(self.page, self.limit, self.total))
    }
}

fn derive_has_more(page: u32, limit: u32, total: u64) -> bool {
    u64::from(page) * u64::from(limit) < total
}

/// Full canonical order snapshot (`GET /items/state`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSnapshot {
    pub selected_order: Vec<ItemId>,
}

/// Body of `PUT /items/selected`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum SelectionCommand {
    Select { id: ItemId },
    Deselect { id: ItemId },
    Reorder { order: Vec<ItemId> },
}

/// Body of `POST /items`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    pub id: ItemId,
}

/// Error body returned by the API on a rejected mutation
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
