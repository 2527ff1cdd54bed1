//! # Selected Order
//!
//! The canonical arrangement of the selected set, shared by the mediator and
//! the reorder coordinator.
//!
//! Every mutation is a complete replace-and-persist performed while holding
//! the container's write lock, so two writers can never interleave and the
//! persisted record always equals some published value.
//!
//! Each local mutation advances a revision. A server snapshot fetched before
//! the latest local mutation is older than the in-memory order and is not
//! adopted; see [`SelectedOrder::adopt_remote`].

use crate::api::ItemId;
use crate::persist::{OrderStore, PersistedRecord};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Observable, persisted sequence of unique selected ids
#[derive(Clone)]
pub struct SelectedOrder {
    ids: Arc<watch::Sender<Vec<ItemId>>>,
    revision: Arc<AtomicU64>,
    store: Arc<dyn OrderStore>,
}

impl SelectedOrder {
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        let (ids, _) = watch::channel(Vec::new());
        Self {
            ids: Arc::new(ids),
            revision: Arc::new(AtomicU64::new(0)),
            store,
        }
    }

    /// Load the saved order into memory without writing it back.
    ///
    /// Returns the saved order if there was one.
    pub fn restore(&self) -> Option<Vec<ItemId>> {
        let record = self.store.get_state()?;
        let order = dedup(record.selected_order);
        self.ids.send_replace(order.clone());
        Some(order)
    }

    pub fn snapshot(&self) -> Vec<ItemId> {
        self.ids.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<ItemId>> {
        self.ids.subscribe()
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.ids.borrow().contains(&id)
    }

    /// Count of local mutations so far
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.borrow().is_empty()
    }

    /// Append `id` at the end. No-op if already present.
    pub fn append(&self, id: ItemId) -> bool {
        self.commit(|ids| {
            if ids.contains(&id) {
                return false;
            }
            ids.push(id);
            true
        })
    }

    /// Remove `id`. No-op if absent.
    pub fn remove(&self, id: ItemId) -> bool {
        self.commit(|ids| {
            let before = ids.len();
            ids.retain(|existing| *existing != id);
            ids.len() != before
        })
    }

    /// Replace the whole order and persist it.
    pub fn replace(&self, order: Vec<ItemId>) {
        let order = dedup(order);
        self.commit(move |ids| {
            *ids = order;
            true
        });
    }

    /// Adopt the order reported by the server. Published to subscribers but
    /// not persisted; the next local mutation writes it out.
    ///
    /// `seen_revision` is [`revision`](Self::revision) as it was when the
    /// snapshot was requested. If a local mutation has landed since, the
    /// snapshot is ignored and `false` is returned.
    pub fn adopt_remote(&self, order: Vec<ItemId>, seen_revision: u64) -> bool {
        let order = dedup(order);
        let revision = &self.revision;
        let mut adopted = false;
        self.ids.send_if_modified(|ids| {
            if revision.load(Ordering::Acquire) != seen_revision {
                return false;
            }
            adopted = true;
            if *ids == order {
                return false;
            }
            *ids = order;
            true
        });
        adopted
    }

    fn commit(&self, mutate: impl FnOnce(&mut Vec<ItemId>) -> bool) -> bool {
        let store = &self.store;
        let revision = &self.revision;
        self.ids.send_if_modified(|ids| {
            if !mutate(ids) {
                return false;
            }
            revision.fetch_add(1, Ordering::AcqRel);
            store.save_state(&PersistedRecord::new(ids.clone()));
            true
        })
    }
}

fn dedup(mut order: Vec<ItemId>) -> Vec<ItemId> {
    let mut seen = HashSet::new();
    order.retain(|id| seen.insert(*id));
    order
}
