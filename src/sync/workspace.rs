//! # Workspace
//!
//! Wires the two panes, the shared order, the mediator and the reorder
//! coordinator around one [`CatalogApi`] and one [`OrderStore`].

use super::mediator::Mediator;
use super::order::SelectedOrder;
use super::pane::{LoadOutcome, PaneKind, PaneManager, PaneSettings};
use super::reorder::{FullOrderSource, ReorderCoordinator, ReorderGesture, ReorderOutcome};
use super::source::{CatalogSource, SelectionSource};
use crate::api::{ApiError, CatalogApi, Item, ItemId};
use crate::persist::OrderStore;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy)]
pub struct WorkspaceSettings {
    pub pane: PaneSettings,
    /// Ask the catalog endpoint to leave out already-selected ids
    pub exclude_selected: bool,
    pub full_order_source: FullOrderSource,
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            pane: PaneSettings::default(),
            exclude_selected: true,
            full_order_source: FullOrderSource::default(),
        }
    }
}

/// What happened while mounting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountReport {
    /// Length of the saved order found in storage, if any
    pub restored: Option<usize>,
    /// The saved order was accepted by the server
    pub reasserted: bool,
    pub available: LoadOutcome,
    pub selected: LoadOutcome,
}

/// Failure of the user-facing add-item action
#[derive(Debug, Error)]
pub enum AddItemError {
    #[error("Enter a valid id (a positive integer), got {0:?}")]
    InvalidInput(String),

    #[error("{}", .0.user_message())]
    Remote(#[source] ApiError),
}

/// Parse user input into an item id. Only positive integers are accepted.
pub fn parse_item_id(input: &str) -> Result<ItemId, AddItemError> {
    let trimmed = input.trim();
    match trimmed.parse::<ItemId>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AddItemError::InvalidInput(trimmed.to_string())),
    }
}

pub struct Workspace {
    api: Arc<dyn CatalogApi>,
    available: Arc<PaneManager>,
    selected: Arc<PaneManager>,
    order: SelectedOrder,
    mediator: Mediator,
    coordinator: ReorderCoordinator,
}

impl Workspace {
    pub fn new(
        api: Arc<dyn CatalogApi>,
        store: Arc<dyn OrderStore>,
        settings: WorkspaceSettings,
    ) -> Self {
        let order = SelectedOrder::new(store);

        let available = Arc::new(PaneManager::new(
            PaneKind::Available,
            Arc::new(CatalogSource::new(api.clone(), settings.exclude_selected)),
            settings.pane,
        ));
        let selected = Arc::new(
            PaneManager::new(
                PaneKind::Selected,
                Arc::new(SelectionSource::new(api.clone())),
                settings.pane,
            )
            .with_order_tracking(order.clone()),
        );

        let mediator = Mediator::new(
            api.clone(),
            available.clone(),
            selected.clone(),
            order.clone(),
        );
        let coordinator = ReorderCoordinator::new(
            api.clone(),
            selected.clone(),
            order.clone(),
            settings.full_order_source,
        );

        Self {
            api,
            available,
            selected,
            order,
            mediator,
            coordinator,
        }
    }

    pub fn pane(&self, kind: PaneKind) -> &Arc<PaneManager> {
        match kind {
            PaneKind::Available => &self.available,
            PaneKind::Selected => &self.selected,
        }
    }

    pub fn available(&self) -> &Arc<PaneManager> {
        &self.available
    }

    pub fn selected(&self) -> &Arc<PaneManager> {
        &self.selected
    }

    pub fn order(&self) -> &SelectedOrder {
        &self.order
    }

    /// Restore the saved order, re-assert it to the server, then load the
    /// first page of both panes.
    ///
    /// The server may have been reset or be a different instance than last
    /// session; pushing the saved order first makes it the one the selected
    /// pane then reads back.
    pub async fn mount(&self) -> MountReport {
        let restored = self.order.restore();
        let mut reasserted = false;

        if let Some(saved) = &restored {
            info!(len = saved.len(), "restoring saved selection order");
            match self.api.reorder(saved).await {
                Ok(()) => reasserted = true,
                Err(e) => warn!(error = %e, "failed to re-assert saved order"),
            }
        }

        let (available, selected) = tokio::join!(
            self.available.load(1, None, true),
            self.selected.load(1, None, true),
        );

        MountReport {
            restored: restored.map(|order| order.len()),
            reasserted,
            available,
            selected,
        }
    }

    /// Validate and create a catalog entry, then refresh the Available pane.
    pub async fn add_item(&self, input: &str) -> Result<ItemId, AddItemError> {
        let id = parse_item_id(input)?;
        self.api.add_item(id).await.map_err(|e| {
            warn!(id, error = %e, "add item failed");
            AddItemError::Remote(e)
        })?;
        info!(id, "item added");
        self.available.refresh().await;
        Ok(id)
    }

    pub async fn select(&self, item: Item) -> Result<(), ApiError> {
        self.mediator.select(item).await
    }

    pub async fn deselect(&self, item: Item) -> Result<(), ApiError> {
        self.mediator.deselect(item).await
    }

    pub async fn reorder(&self, gesture: ReorderGesture) -> ReorderOutcome {
        self.coordinator.reorder(gesture).await
    }
}
