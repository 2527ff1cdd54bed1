//! # Reorder Coordinator
//!
//! Turns a drag gesture on the (possibly filtered, partially loaded)
//! Selected pane into a new canonical order.
//!
//! ## Protocol
//!
//! 1. Validate the gesture against the visible list.
//! 2. Move the row locally right away.
//! 3. Splice the move into the *full* order: the dragged id is removed and
//!    re-inserted at the index the target id held. Dragging down lands after
//!    the target, dragging up lands before it, mirroring the visible move.
//! 4. Persist the new order and send it to the server.
//!
//! If the full order does not contain both ids (it raced another mutation)
//! or cannot be obtained, the reorder is abandoned and the visible move is
//! rolled back, provided the pane still shows it. A failed remote commit is
//! only logged: the order is already persisted locally and is re-asserted to
//! the server on the next mount.

use super::order::SelectedOrder;
use super::pane::PaneManager;
use crate::api::{CatalogApi, ItemId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where the coordinator reads the full order from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FullOrderSource {
    /// Fetch `GET /items/state` on every reorder
    #[default]
    Remote,
    /// Use the locally held copy of the order
    Cached,
}

/// A drop of one visible row onto another
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReorderGesture {
    pub dragged_id: ItemId,
    pub target_id: ItemId,
    pub dragged_index: usize,
    pub target_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReorderOutcome {
    /// The gesture was not valid; nothing changed
    Ignored(IgnoreReason),
    /// The new order was persisted; `remote_acknowledged` tells whether the
    /// server accepted it too
    Committed {
        order: Vec<ItemId>,
        remote_acknowledged: bool,
    },
    /// The full order could not be reconciled
    Abandoned { rolled_back: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    SameItem,
    IndexOutOfRange,
    /// The rows at the given indices are not the ones named by the gesture
    ItemMismatch,
}

pub struct ReorderCoordinator {
    api: Arc<dyn CatalogApi>,
    selected: Arc<PaneManager>,
    order: SelectedOrder,
    source: FullOrderSource,
}

impl ReorderCoordinator {
    pub fn new(
        api: Arc<dyn CatalogApi>,
        selected: Arc<PaneManager>,
        order: SelectedOrder,
        source: FullOrderSource,
    ) -> Self {
        Self {
            api,
            selected,
            order,
            source,
        }
    }

    pub async fn reorder(&self, gesture: ReorderGesture) -> ReorderOutcome {
        let generation = match self.validate(&gesture) {
            Ok(generation) => generation,
            Err(reason) => {
                debug!(?gesture, ?reason, "reorder ignored");
                return ReorderOutcome::Ignored(reason);
            }
        };

        self.selected
            .move_local(gesture.dragged_index, gesture.target_index);

        let Some(full) = self.full_order().await else {
            return self.abandon(&gesture, generation);
        };
        let Some(next) = splice_order(&full, gesture.dragged_id, gesture.target_id) else {
            warn!(
                dragged = gesture.dragged_id,
                target = gesture.target_id,
                "reorder abandoned: id missing from full order"
            );
            return self.abandon(&gesture, generation);
        };

        self.order.replace(next.clone());
        let remote_acknowledged = match self.api.reorder(&next).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "failed to commit reorder to server");
                false
            }
        };
        info!(
            dragged = gesture.dragged_id,
            target = gesture.target_id,
            remote_acknowledged,
            "selection reordered"
        );

        ReorderOutcome::Committed {
            order: next,
            remote_acknowledged,
        }
    }

    fn validate(&self, gesture: &ReorderGesture) -> Result<u64, IgnoreReason> {
        if gesture.dragged_id == gesture.target_id {
            return Err(IgnoreReason::SameItem);
        }
        let state = self.selected.snapshot();
        let (Some(dragged), Some(target)) = (
            state.items.get(gesture.dragged_index),
            state.items.get(gesture.target_index),
        ) else {
            return Err(IgnoreReason::IndexOutOfRange);
        };
        if dragged.id != gesture.dragged_id || target.id != gesture.target_id {
            return Err(IgnoreReason::ItemMismatch);
        }
        Ok(state.generation())
    }

    async fn full_order(&self) -> Option<Vec<ItemId>> {
        match self.source {
            FullOrderSource::Cached => Some(self.order.snapshot()),
            FullOrderSource::Remote => match self.api.fetch_order().await {
                Ok(snapshot) => Some(snapshot.selected_order),
                Err(e) => {
                    warn!(error = %e, "reorder abandoned: could not fetch full order");
                    None
                }
            },
        }
    }

    /// Undo the optimistic move if the pane still shows it.
    fn abandon(&self, gesture: &ReorderGesture, generation: u64) -> ReorderOutcome {
        let state = self.selected.snapshot();
        let still_shown = state.generation() == generation
            && state.position(gesture.dragged_id) == Some(gesture.target_index);
        let rolled_back = still_shown
            && self
                .selected
                .move_local(gesture.target_index, gesture.dragged_index);
        ReorderOutcome::Abandoned { rolled_back }
    }
}

/// Remove `dragged` and re-insert it at the index `target` occupied.
///
/// `None` if either id is missing.
pub fn splice_order(full: &[ItemId], dragged: ItemId, target: ItemId) -> Option<Vec<ItemId>> {
    let from = full.iter().position(|id| *id == dragged)?;
    let to = full.iter().position(|id| *id == target)?;

    let mut next = full.to_vec();
    let id = next.remove(from);
    next.insert(to, id);
    Some(next)
}
