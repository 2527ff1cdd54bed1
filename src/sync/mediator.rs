//! # Cross-Pane Mediator
//!
//! Moves one item between the panes. The remote mutation always goes first;
//! local state is touched only once the server has acknowledged, so the UI
//! never shows a selection the server did not record.

use super::order::SelectedOrder;
use super::pane::PaneManager;
use crate::api::{ApiError, CatalogApi, Item};
use std::sync::Arc;
use tracing::{info, warn};

pub struct Mediator {
    api: Arc<dyn CatalogApi>,
    available: Arc<PaneManager>,
    selected: Arc<PaneManager>,
    order: SelectedOrder,
}

impl Mediator {
    pub fn new(
        api: Arc<dyn CatalogApi>,
        available: Arc<PaneManager>,
        selected: Arc<PaneManager>,
        order: SelectedOrder,
    ) -> Self {
        Self {
            api,
            available,
            selected,
            order,
        }
    }

    /// Move `item` from Available to Selected.
    pub async fn select(&self, item: Item) -> Result<(), ApiError> {
        if let Err(e) = self.api.select(item.id).await {
            warn!(id = item.id, error = %e, "select failed");
            return Err(e);
        }

        self.available.remove_local(item.id);
        self.selected.add_local(item);
        self.order.append(item.id);
        info!(id = item.id, "item selected");
        Ok(())
    }

    /// Move `item` from Selected back to Available.
    pub async fn deselect(&self, item: Item) -> Result<(), ApiError> {
        if let Err(e) = self.api.deselect(item.id).await {
            warn!(id = item.id, error = %e, "deselect failed");
            return Err(e);
        }

        self.selected.remove_local(item.id);
        self.available.add_local(item);
        self.order.remove(item.id);
        info!(id = item.id, "item deselected");
        Ok(())
    }
}
