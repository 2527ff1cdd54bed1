//! # In-Memory Catalog
//!
//! A complete [`CatalogApi`] held in process memory. Backs `--offline` mode
//! and stands in for the server in tests.
//!
//! Every call is journaled, and a single failure can be armed per operation
//! with [`InMemoryCatalog::fail_next`].

use super::client::CatalogApi;
use super::error::ApiError;
use super::model::{Item, ItemId, ItemsPage, OrderSnapshot, PageQuery, SelectedPage};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashSet};
use std::sync::{Mutex, MutexGuard};

/// Catalog operations, used to arm failures and read the journal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListItems,
    ListSelected,
    AddItem,
    Select,
    Deselect,
    Reorder,
    FetchOrder,
}

/// One journaled call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub operation: Operation,
    /// Present for the two list operations
    pub query: Option<PageQuery>,
    /// Present for add/select/deselect
    pub id: Option<ItemId>,
}

#[derive(Debug, Default)]
struct CatalogState {
    items: BTreeSet<ItemId>,
    selected: Vec<ItemId>,
    armed_failures: HashSet<Operation>,
    journal: Vec<RecordedCall>,
}

/// In-memory implementation of the catalog API
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    state: Mutex<CatalogState>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog pre-populated with ids `1..=count`
    pub fn seeded(count: u64) -> Self {
        Self::with_items(1..=count)
    }

    pub fn with_items(ids: impl IntoIterator<Item = ItemId>) -> Self {
        let catalog = Self::new();
        if let Ok(mut state) = catalog.state.lock() {
            state.items.extend(ids.into_iter().filter(|id| *id > 0));
        }
        catalog
    }

    /// Mark ids as selected, in the given order. Unknown ids are ignored.
    pub fn preselect(&self, ids: &[ItemId]) {
        if let Ok(mut state) = self.state.lock() {
            for id in ids {
                if state.items.contains(id) && !state.selected.contains(id) {
                    state.selected.push(*id);
                }
            }
        }
    }

    /// Make the next call of `operation` fail with [`ApiError::Unavailable`].
    pub fn fail_next(&self, operation: Operation) {
        if let Ok(mut state) = self.state.lock() {
            state.armed_failures.insert(operation);
        }
    }

    /// Current canonical selection order
    pub fn selected_order(&self) -> Vec<ItemId> {
        self.state
            .lock()
            .map(|state| state.selected.clone())
            .unwrap_or_default()
    }

    /// All calls received so far, oldest first
    pub fn journal(&self) -> Vec<RecordedCall> {
        self.state
            .lock()
            .map(|state| state.journal.clone())
            .unwrap_or_default()
    }

    /// Calls of one kind
    pub fn calls(&self, operation: Operation) -> Vec<RecordedCall> {
        self.journal()
            .into_iter()
            .filter(|call| call.operation == operation)
            .collect()
    }

    /// Lock the state, journal the call and fire an armed failure if any.
    fn enter(
        &self,
        operation: Operation,
        query: Option<&PageQuery>,
        id: Option<ItemId>,
    ) -> Result<MutexGuard<'_, CatalogState>, ApiError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| ApiError::Unavailable("catalog state poisoned".to_string()))?;
        state.journal.push(RecordedCall {
            operation,
            query: query.cloned(),
            id,
        });
        if state.armed_failures.remove(&operation) {
            return Err(ApiError::Unavailable(format!("{operation:?} failed")));
        }
        Ok(state)
    }
}

fn matches_filter(id: ItemId, filter: Option<&str>) -> bool {
    match filter.map(str::trim).filter(|f| !f.is_empty()) {
        Some(filter) => id.to_string().contains(filter),
        None => true,
    }
}

/// Slice one page out of the full matching list.
fn paginate(matching: &[ItemId], query: &PageQuery) -> (Vec<Item>, bool) {
    let limit = query.limit.max(1) as usize;
    let start = (query.page.max(1) as usize - 1).saturating_mul(limit);
    let items: Vec<Item> = matching
        .iter()
        .skip(start)
        .take(limit)
        .map(|id| Item::new(*id))
        .collect();
    let has_more = start + items.len() < matching.len();
    (items, has_more)
}

#[async_trait]
impl CatalogApi for InMemoryCatalog {
    async fn list_items(
        &self,
        query: &PageQuery,
        exclude_selected: bool,
    ) -> Result<ItemsPage, ApiError> {
        let state = self.enter(Operation::ListItems, Some(query), None)?;
        let selected: HashSet<ItemId> = if exclude_selected {
            state.selected.iter().copied().collect()
        } else {
            HashSet::new()
        };
        let matching: Vec<ItemId> = state
            .items
            .iter()
            .copied()
            .filter(|id| !selected.contains(id))
            .filter(|id| matches_filter(*id, query.filter.as_deref()))
            .collect();
        let (items, has_more) = paginate(&matching, query);

        Ok(ItemsPage {
            items,
            total: matching.len() as u64,
            page: query.page.max(1),
            limit: query.limit,
            has_more: Some(has_more),
        })
    }

    async fn list_selected(&self, query: &PageQuery) -> Result<SelectedPage, ApiError> {
        let state = self.enter(Operation::ListSelected, Some(query), None)?;
        let matching: Vec<ItemId> = state
            .selected
            .iter()
            .copied()
            .filter(|id| matches_filter(*id, query.filter.as_deref()))
            .collect();
        let (items, has_more) = paginate(&matching, query);

        Ok(SelectedPage {
            items,
            total: matching.len() as u64,
            page: query.page.max(1),
            limit: query.limit,
            has_more: Some(has_more),
            order: state.selected.clone(),
        })
    }

    async fn add_item(&self, id: ItemId) -> Result<(), ApiError> {
        let mut state = self.enter(Operation::AddItem, None, Some(id))?;
        if id == 0 {
            return Err(ApiError::Rejected(
                "Item id must be a positive integer".to_string(),
            ));
        }
        if !state.items.insert(id) {
            return Err(ApiError::Rejected(format!(
                "Item with id {id} already exists"
            )));
        }
        Ok(())
    }

    async fn select(&self, id: ItemId) -> Result<(), ApiError> {
        let mut state = self.enter(Operation::Select, None, Some(id))?;
        if !state.items.contains(&id) {
            return Err(ApiError::Rejected(format!("Item with id {id} not found")));
        }
        if !state.selected.contains(&id) {
            state.selected.push(id);
        }
        Ok(())
    }

    async fn deselect(&self, id: ItemId) -> Result<(), ApiError> {
        let mut state = self.enter(Operation::Deselect, None, Some(id))?;
        state.selected.retain(|selected| *selected != id);
        Ok(())
    }

    async fn reorder(&self, order: &[ItemId]) -> Result<(), ApiError> {
        let mut state = self.enter(Operation::Reorder, None, None)?;
        let mut seen = HashSet::new();
        let next: Vec<ItemId> = order
            .iter()
            .copied()
            .filter(|id| state.items.contains(id) && seen.insert(*id))
            .collect();
        state.selected = next;
        Ok(())
    }

    async fn fetch_order(&self) -> Result<OrderSnapshot, ApiError> {
        let state = self.enter(Operation::FetchOrder, None, None)?;
        Ok(OrderSnapshot {
            selected_order: state.selected.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: u32, limit: u32, filter: Option<&str>) -> PageQuery {
        PageQuery {
            page,
            limit,
            filter: filter.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_list_items_paginates() {
        let catalog = InMemoryCatalog::seeded(5);

        let first = catalog.list_items(&query(1, 2, None), true).await.unwrap();
        assert_eq!(first.items, vec![Item::new(1), Item::new(2)]);
        assert_eq!(first.total, 5);
        assert!(first.has_more());

        let last = catalog.list_items(&query(3, 2, None), true).await.unwrap();
        assert_eq!(last.items, vec![Item::new(5)]);
        assert!(!last.has_more());
    }

    #[tokio::test]
    async fn test_list_items_filters_by_id_substring() {
        let catalog = InMemoryCatalog::seeded(30);
        let page = catalog
            .list_items(&query(1, 50, Some("2")), true)
            .await
            .unwrap();
        let ids: Vec<ItemId> = page.items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![2, 12, 20, 21, 22, 23, 24, 25, 26, 27, 28, 29]);
        assert_eq!(page.total, 12);
    }

    #[tokio::test]
    async fn test_exclude_selected_is_optional() {
        let catalog = InMemoryCatalog::seeded(3);
        catalog.preselect(&[2]);

        let excluded = catalog.list_items(&query(1, 10, None), true).await.unwrap();
        assert_eq!(excluded.items, vec![Item::new(1), Item::new(3)]);

        let included = catalog.list_items(&query(1, 10, None), false).await.unwrap();
        assert_eq!(included.total, 3);
    }

    #[tokio::test]
    async fn test_selected_page_follows_canonical_order() {
        let catalog = InMemoryCatalog::seeded(5);
        catalog.select(4).await.unwrap();
        catalog.select(1).await.unwrap();
        catalog.select(3).await.unwrap();

        let page = catalog.list_selected(&query(1, 2, None)).await.unwrap();
        assert_eq!(page.items, vec![Item::new(4), Item::new(1)]);
        assert_eq!(page.order, vec![4, 1, 3]);
        assert!(page.has_more());
    }

    #[tokio::test]
    async fn test_add_item_rejects_duplicates_and_zero() {
        let catalog = InMemoryCatalog::seeded(3);
        assert!(matches!(
            catalog.add_item(2).await,
            Err(ApiError::Rejected(_))
        ));
        assert!(matches!(
            catalog.add_item(0).await,
            Err(ApiError::Rejected(_))
        ));
        catalog.add_item(10).await.unwrap();
        let page = catalog.list_items(&query(1, 10, None), true).await.unwrap();
        assert_eq!(page.total, 4);
    }

    #[tokio::test]
    async fn test_reorder_replaces_selection_wholesale() {
        let catalog = InMemoryCatalog::seeded(5);
        catalog.preselect(&[1, 2]);

        catalog.reorder(&[5, 99, 3, 5]).await.unwrap();
        assert_eq!(catalog.selected_order(), vec![5, 3]);
    }

    #[tokio::test]
    async fn test_fail_next_fires_once() {
        let catalog = InMemoryCatalog::seeded(3);
        catalog.fail_next(Operation::Select);

        assert!(catalog.select(1).await.is_err());
        assert!(catalog.selected_order().is_empty());
        catalog.select(1).await.unwrap();
        assert_eq!(catalog.selected_order(), vec![1]);
        assert_eq!(catalog.calls(Operation::Select).len(), 2);
    }
}
