//! # Pane State Manager
//!
//! One implementation serves both panes. What differs between them is
//! injected: the [`PageSource`] that fetches pages, and for the Selected pane
//! an order-tracking extension that adopts the canonical order reported
//! alongside each reset page.
//!
//! ## Loading rules
//!
//! - At most one load per pane is in flight. A non-reset load issued while
//!   another is in flight is dropped.
//! - A reset load (filter change, refresh) always starts. It advances the
//!   pane's generation, and any response that was requested under an older
//!   generation is discarded on arrival instead of overwriting newer data.
//! - Appends are idempotent: only ids not already loaded are added, so
//!   overlapping pages and items handed over by [`PaneManager::add_local`]
//!   never duplicate.
//! - Failures are logged and leave the pane as it was, minus the loading
//!   flag. Nothing is retried; the next scroll or filter edit is the retry.
//! - Hand-offs made while a load is in flight are replayed over its
//!   response, which may have been produced before the server saw them.
//! - Each hand-off that removes an item from the server's listing moves
//!   later items one slot earlier, so the next page request steps back far
//!   enough to cover the items that slid across the page boundary.
//!
//! State is published through a `tokio::sync::watch` channel; renderers
//! subscribe and redraw on change.

use super::debounce::Debouncer;
use super::order::SelectedOrder;
use super::source::{Page, PageSource};
use crate::api::{ApiError, Item, ItemId, PageQuery};
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Default number of items requested per page
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Default quiet period before a filter edit is applied
pub const DEFAULT_FILTER_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaneKind {
    Available,
    Selected,
}

impl PaneKind {
    pub fn title(self) -> &'static str {
        match self {
            PaneKind::Available => "Available",
            PaneKind::Selected => "Selected",
        }
    }

    pub fn other(self) -> Self {
        match self {
            PaneKind::Available => PaneKind::Selected,
            PaneKind::Selected => PaneKind::Available,
        }
    }
}

impl fmt::Display for PaneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Everything a pane knows about its list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaneState {
    /// Loaded items in insertion order, unique by id
    pub items: Vec<Item>,
    /// Filter the loaded items were fetched with
    pub filter: Option<String>,
    /// Last page applied; 0 before the first load
    pub current_page: u32,
    pub is_loading: bool,
    /// The server reported no further pages for the current filter
    pub exhausted: bool,
    /// Matching-filter count last reported by the server
    pub total: u64,
    generation: u64,
    in_flight: Option<u64>,
    /// Hand-offs made while `in_flight` was set
    pending_edits: Vec<LocalEdit>,
    /// Items that left the server listing since the last applied page
    shifted: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum LocalEdit {
    Added(Item),
    Removed(ItemId),
}

/// What `begin_load` saw, checked again when the response arrives
#[derive(Debug, Clone, Copy)]
struct LoadTicket {
    generation: u64,
    shifted: u32,
    order_revision: Option<u64>,
}

impl PaneState {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.items.iter().any(|item| item.id == id)
    }

    pub fn position(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    /// Staleness token; advances on every reset load
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Every matching item is loaded
    pub fn fully_loaded(&self) -> bool {
        self.exhausted && !self.items.is_empty()
    }
}

/// Result of a load request, for callers that care
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Page applied; `added` new items became visible
    Applied { added: usize },
    /// The request was not sent
    Skipped(SkipReason),
    /// The response arrived after a newer reset and was discarded
    Stale,
    /// The request failed; the pane is unchanged
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    InFlight,
    Exhausted,
    Empty,
}

/// Tunables shared by both panes
#[derive(Debug, Clone, Copy)]
pub struct PaneSettings {
    pub page_size: u32,
    pub filter_debounce: Duration,
}

impl Default for PaneSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            filter_debounce: DEFAULT_FILTER_DEBOUNCE,
        }
    }
}

pub struct PaneManager {
    kind: PaneKind,
    source: Arc<dyn PageSource>,
    order: Option<SelectedOrder>,
    page_size: u32,
    debouncer: Debouncer,
    state: watch::Sender<PaneState>,
}

impl PaneManager {
    pub fn new(kind: PaneKind, source: Arc<dyn PageSource>, settings: PaneSettings) -> Self {
        let (state, _) = watch::channel(PaneState::default());
        Self {
            kind,
            source,
            order: None,
            page_size: settings.page_size.max(1),
            debouncer: Debouncer::new(settings.filter_debounce),
            state,
        }
    }

    /// Adopt the canonical order reported with each reset page into `order`.
    pub fn with_order_tracking(mut self, order: SelectedOrder) -> Self {
        self.order = Some(order);
        self
    }

    pub fn kind(&self) -> PaneKind {
        self.kind
    }

    pub fn subscribe(&self) -> watch::Receiver<PaneState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> PaneState {
        self.state.borrow().clone()
    }

    pub fn item_at(&self, index: usize) -> Option<Item> {
        self.state.borrow().items.get(index).copied()
    }

    /// Fetch `page` and merge it in (or replace everything when `reset`).
    pub async fn load(&self, page: u32, filter: Option<String>, reset: bool) -> LoadOutcome {
        let ticket = match self.begin_load(reset) {
            Ok(ticket) => ticket,
            Err(reason) => {
                debug!(pane = %self.kind, page, ?reason, "load skipped");
                return LoadOutcome::Skipped(reason);
            }
        };

        let query = PageQuery {
            page: page.max(1),
            limit: self.page_size,
            filter: normalize_filter(filter),
        };
        debug!(pane = %self.kind, page = query.page, filter = ?query.filter, reset, "loading page");
        let result = self.source.fetch_page(&query).await;
        self.finish_load(ticket, &query, reset, result)
    }

    /// Reload page 1 with the current filter.
    pub async fn refresh(&self) -> LoadOutcome {
        let filter = self.state.borrow().filter.clone();
        self.load(1, filter, true).await
    }

    /// Next page with the current filter. Sensor-driven.
    pub async fn request_next_page(&self) -> LoadOutcome {
        let (page, filter) = {
            let state = self.state.borrow();
            let skip = if state.in_flight.is_some() {
                Some(SkipReason::InFlight)
            } else if state.exhausted {
                Some(SkipReason::Exhausted)
            } else if state.items.is_empty() {
                Some(SkipReason::Empty)
            } else {
                None
            };
            if let Some(reason) = skip {
                return LoadOutcome::Skipped(reason);
            }
            let page = next_page(state.current_page, state.shifted, self.page_size);
            (page, state.filter.clone())
        };
        self.load(page, filter, false).await
    }

    /// Apply `text` as the filter once typing pauses.
    ///
    /// Each call cancels the previous pending one; only the last edit in a
    /// burst produces a request.
    pub fn set_filter(self: &Arc<Self>, text: &str) {
        let filter = normalize_filter(Some(text.to_string()));
        let pane: Weak<Self> = Arc::downgrade(self);
        debug!(pane = %self.kind, ?filter, "filter edit scheduled");
        self.debouncer.schedule(async move {
            if let Some(pane) = pane.upgrade() {
                pane.load(1, filter, true).await;
            }
        });
    }

    /// Whether a filter edit is still waiting out the debounce delay
    pub fn filter_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Insert `item` at the end if absent. No remote call.
    pub fn add_local(&self, item: Item) -> bool {
        self.state.send_if_modified(|state| {
            if state.contains(item.id) {
                return false;
            }
            state.items.push(item);
            if state.in_flight.is_some() {
                state.pending_edits.push(LocalEdit::Added(item));
            }
            true
        })
    }

    /// Remove the item with `id` if present. No remote call.
    pub fn remove_local(&self, id: ItemId) -> bool {
        let shifts = self.source.hand_off_shifts_pages();
        self.state.send_if_modified(|state| {
            let before = state.items.len();
            state.items.retain(|item| item.id != id);
            if state.items.len() == before {
                return false;
            }
            if shifts {
                state.shifted = state.shifted.saturating_add(1);
            }
            if state.in_flight.is_some() {
                state.pending_edits.push(LocalEdit::Removed(id));
            }
            true
        })
    }

    /// Move the row at `from` to `to` (remove, then insert). No remote call.
    pub fn move_local(&self, from: usize, to: usize) -> bool {
        self.state.send_if_modified(|state| {
            let len = state.items.len();
            if from >= len || to >= len || from == to {
                return false;
            }
            let item = state.items.remove(from);
            state.items.insert(to, item);
            true
        })
    }

    fn begin_load(&self, reset: bool) -> Result<LoadTicket, SkipReason> {
        let order_revision = self.order.as_ref().map(SelectedOrder::revision);
        let mut ticket = Err(SkipReason::InFlight);
        self.state.send_if_modified(|state| {
            if reset {
                state.generation += 1;
                state.shifted = 0;
            } else if state.in_flight.is_some() {
                return false;
            } else if state.exhausted {
                ticket = Err(SkipReason::Exhausted);
                return false;
            }
            state.in_flight = Some(state.generation);
            state.is_loading = true;
            state.pending_edits.clear();
            ticket = Ok(LoadTicket {
                generation: state.generation,
                shifted: state.shifted,
                order_revision,
            });
            true
        });
        ticket
    }

    fn finish_load(
        &self,
        ticket: LoadTicket,
        query: &PageQuery,
        reset: bool,
        result: Result<Page, ApiError>,
    ) -> LoadOutcome {
        let kind = self.kind;
        let mut outcome = LoadOutcome::Stale;
        let mut reported_order = None;

        self.state.send_if_modified(|state| {
            if state.generation != ticket.generation {
                return false;
            }
            state.in_flight = None;
            state.is_loading = false;
            let edits = std::mem::take(&mut state.pending_edits);

            match result {
                Err(e) => {
                    warn!(pane = %kind, page = query.page, error = %e, "page load failed");
                    outcome = LoadOutcome::Failed;
                }
                Ok(page) => {
                    if reset {
                        state.items.clear();
                        state.filter = query.filter.clone();
                        reported_order = page.order;
                    }
                    let added = merge_unseen(&mut state.items, page.items);
                    replay(&mut state.items, &edits);
                    state.current_page = query.page;
                    state.shifted = state.shifted.saturating_sub(ticket.shifted);
                    state.exhausted = !page.has_more;
                    state.total = page.total;
                    outcome = LoadOutcome::Applied { added };
                }
            }
            true
        });

        match outcome {
            LoadOutcome::Stale => {
                debug!(pane = %kind, page = query.page, "discarding response from superseded load");
            }
            LoadOutcome::Applied { added } => {
                debug!(pane = %kind, page = query.page, added, "page applied");
                if let (Some(tracker), Some(order), Some(revision)) =
                    (&self.order, reported_order, ticket.order_revision)
                {
                    if !tracker.adopt_remote(order, revision) {
                        debug!(pane = %kind, "order changed locally during load, keeping local order");
                    }
                }
            }
            _ => {}
        }
        outcome
    }
}

/// Append items whose id is not already present; returns how many were added.
fn merge_unseen(items: &mut Vec<Item>, incoming: Vec<Item>) -> usize {
    let mut seen: HashSet<ItemId> = items.iter().map(|item| item.id).collect();
    let before = items.len();
    items.extend(incoming.into_iter().filter(|item| seen.insert(item.id)));
    items.len() - before
}

/// Re-apply hand-offs the response may predate.
fn replay(items: &mut Vec<Item>, edits: &[LocalEdit]) {
    for edit in edits {
        match *edit {
            LocalEdit::Added(item) => {
                if !items.iter().any(|existing| existing.id == item.id) {
                    items.push(item);
                }
            }
            LocalEdit::Removed(id) => items.retain(|existing| existing.id != id),
        }
    }
}

/// Page holding the first unseen item once `shifted` loaded items have left
/// the server listing.
fn next_page(current_page: u32, shifted: u32, page_size: u32) -> u32 {
    let page_size = u64::from(page_size.max(1));
    let seen = u64::from(current_page) * page_size;
    let first_unseen = seen.saturating_sub(u64::from(shifted));
    u32::try_from(first_unseen / page_size + 1).unwrap_or(u32::MAX)
}

fn normalize_filter(filter: Option<String>) -> Option<String> {
    filter
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::sync::oneshot;
    use tracing_test::traced_test;

    type Reply = Result<Page, ApiError>;

    /// Source whose responses are released by the test, in any order
    #[derive(Default)]
    struct GatedSource {
        replies: Mutex<VecDeque<oneshot::Receiver<Reply>>>,
        queries: Mutex<Vec<PageQuery>>,
    }

    impl GatedSource {
        fn respond(&self, reply: Reply) {
            let (tx, rx) = oneshot::channel();
            tx.send(reply).ok();
            self.replies.lock().unwrap().push_back(rx);
        }

        fn gate(&self) -> oneshot::Sender<Reply> {
            let (tx, rx) = oneshot::channel();
            self.replies.lock().unwrap().push_back(rx);
            tx
        }

        fn queries(&self) -> Vec<PageQuery> {
            self.queries.lock().unwrap().clone()
        }

        async fn wait_for_fetches(&self, count: usize) {
            while self.queries.lock().unwrap().len() < count {
                tokio::task::yield_now().await;
            }
        }
    }

    #[async_trait]
    impl PageSource for GatedSource {
        async fn fetch_page(&self, query: &PageQuery) -> Result<Page, ApiError> {
            self.queries.lock().unwrap().push(query.clone());
            let rx = self.replies.lock().unwrap().pop_front();
            match rx {
                Some(rx) => rx
                    .await
                    .unwrap_or_else(|_| Err(ApiError::Unavailable("gate dropped".into()))),
                None => Err(ApiError::Unavailable("no scripted reply".into())),
            }
        }
    }

    fn page(ids: &[ItemId], has_more: bool) -> Reply {
        Ok(Page {
            items: ids.iter().map(|id| Item::new(*id)).collect(),
            total: 100,
            page: 1,
            has_more,
            order: None,
        })
    }

    fn ids(state: &PaneState) -> Vec<ItemId> {
        state.items.iter().map(|item| item.id).collect()
    }

    fn pane(source: &Arc<GatedSource>) -> Arc<PaneManager> {
        Arc::new(PaneManager::new(
            PaneKind::Available,
            source.clone(),
            PaneSettings::default(),
        ))
    }

    #[tokio::test]
    async fn test_reset_replaces_and_append_deduplicates() {
        let source = Arc::new(GatedSource::default());
        let pane = pane(&source);

        source.respond(page(&[1, 2, 3], true));
        source.respond(page(&[3, 4, 2, 5], true));

        assert_eq!(
            pane.load(1, None, true).await,
            LoadOutcome::Applied { added: 3 }
        );
        assert_eq!(
            pane.load(2, None, false).await,
            LoadOutcome::Applied { added: 2 }
        );

        let state = pane.snapshot();
        assert_eq!(ids(&state), vec![1, 2, 3, 4, 5]);
        assert_eq!(state.current_page, 2);
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn test_all_known_page_is_accepted_silently() {
        let source = Arc::new(GatedSource::default());
        let pane = pane(&source);
        source.respond(page(&[1, 2], true));
        source.respond(page(&[2, 1], true));

        pane.load(1, None, true).await;

        assert_eq!(
            pane.load(2, None, false).await,
            LoadOutcome::Applied { added: 0 }
        );
        assert_eq!(ids(&pane.snapshot()), vec![1, 2]);
        assert_eq!(pane.snapshot().current_page, 2);
    }

    #[tokio::test]
    async fn test_exhausted_pane_stops_paging() {
        let source = Arc::new(GatedSource::default());
        let pane = pane(&source);
        source.respond(page(&[1, 2], false));

        pane.load(1, None, true).await;
        assert!(pane.snapshot().exhausted);
        assert!(pane.snapshot().fully_loaded());

        assert_eq!(
            pane.request_next_page().await,
            LoadOutcome::Skipped(SkipReason::Exhausted)
        );
        assert_eq!(
            pane.load(2, None, false).await,
            LoadOutcome::Skipped(SkipReason::Exhausted)
        );
        assert_eq!(source.queries().len(), 1);
    }

    #[tokio::test]
    async fn test_next_page_skipped_when_empty() {
        let source = Arc::new(GatedSource::default());
        let pane = pane(&source);

        assert_eq!(
            pane.request_next_page().await,
            LoadOutcome::Skipped(SkipReason::Empty)
        );
        assert!(source.queries().is_empty());
    }

    #[tokio::test]
    async fn test_next_page_skipped_while_in_flight() {
        let source = Arc::new(GatedSource::default());
        let pane = pane(&source);
        source.respond(page(&[1], true));
        pane.load(1, None, true).await;

        let gate = source.gate();
        let task = tokio::spawn({
            let pane = pane.clone();
            async move { pane.request_next_page().await }
        });
        source.wait_for_fetches(2).await;
        assert!(pane.snapshot().is_loading);

        assert_eq!(
            pane.request_next_page().await,
            LoadOutcome::Skipped(SkipReason::InFlight)
        );
        assert_eq!(
            pane.load(5, None, false).await,
            LoadOutcome::Skipped(SkipReason::InFlight)
        );

        gate.send(page(&[2], true)).ok();
        assert_eq!(task.await.unwrap(), LoadOutcome::Applied { added: 1 });
        assert_eq!(source.queries().len(), 2);
        assert_eq!(source.queries()[1].page, 2);
    }

    #[tokio::test]
    async fn test_stale_reset_never_overwrites_newer_filter() {
        let source = Arc::new(GatedSource::default());
        let pane = pane(&source);

        let old_gate = source.gate();
        let new_gate = source.gate();

        let old = tokio::spawn({
            let pane = pane.clone();
            async move { pane.load(1, Some("1".into()), true).await }
        });
        source.wait_for_fetches(1).await;
        let new = tokio::spawn({
            let pane = pane.clone();
            async move { pane.load(1, Some("2".into()), true).await }
        });
        source.wait_for_fetches(2).await;

        // Newer response lands first, older one afterwards
        new_gate.send(page(&[2, 12], false)).ok();
        assert_eq!(new.await.unwrap(), LoadOutcome::Applied { added: 2 });
        old_gate.send(page(&[1, 10, 11], true)).ok();
        assert_eq!(old.await.unwrap(), LoadOutcome::Stale);

        let state = pane.snapshot();
        assert_eq!(ids(&state), vec![2, 12]);
        assert_eq!(state.filter.as_deref(), Some("2"));
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn test_stale_append_is_discarded_after_reset() {
        let source = Arc::new(GatedSource::default());
        let pane = pane(&source);
        source.respond(page(&[1, 2], true));
        pane.load(1, None, true).await;

        let append_gate = source.gate();
        let append = tokio::spawn({
            let pane = pane.clone();
            async move { pane.request_next_page().await }
        });
        source.wait_for_fetches(2).await;

        source.respond(page(&[7], false));
        assert_eq!(
            pane.load(1, Some("7".into()), true).await,
            LoadOutcome::Applied { added: 1 }
        );

        append_gate.send(page(&[3, 4], true)).ok();
        assert_eq!(append.await.unwrap(), LoadOutcome::Stale);
        assert_eq!(ids(&pane.snapshot()), vec![7]);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_failed_load_leaves_state_and_logs() {
        let source = Arc::new(GatedSource::default());
        let pane = pane(&source);
        source.respond(page(&[1, 2], true));
        pane.load(1, None, true).await;
        let before = pane.snapshot();

        source.respond(Err(ApiError::Unavailable("boom".into())));
        assert_eq!(pane.request_next_page().await, LoadOutcome::Failed);

        let after = pane.snapshot();
        assert_eq!(ids(&after), ids(&before));
        assert_eq!(after.current_page, before.current_page);
        assert!(!after.is_loading);
        assert!(logs_contain("page load failed"));

        // The next signal retries the same page
        source.respond(page(&[3], true));
        assert_eq!(
            pane.request_next_page().await,
            LoadOutcome::Applied { added: 1 }
        );
        assert_eq!(source.queries()[2].page, 2);
    }

    #[tokio::test]
    async fn test_add_local_is_idempotent() {
        let source = Arc::new(GatedSource::default());
        let pane = pane(&source);
        source.respond(page(&[1, 2], true));
        pane.load(1, None, true).await;

        assert!(pane.add_local(Item::new(7)));
        assert_eq!(ids(&pane.snapshot()), vec![1, 2, 7]);

        assert!(!pane.add_local(Item::new(2)));
        assert_eq!(ids(&pane.snapshot()), vec![1, 2, 7]);
    }

    #[tokio::test]
    async fn test_remove_and_move_local() {
        let source = Arc::new(GatedSource::default());
        let pane = pane(&source);
        source.respond(page(&[1, 2, 3, 4], true));
        pane.load(1, None, true).await;

        assert!(pane.remove_local(2));
        assert!(!pane.remove_local(2));
        assert_eq!(ids(&pane.snapshot()), vec![1, 3, 4]);

        assert!(pane.move_local(0, 2));
        assert_eq!(ids(&pane.snapshot()), vec![3, 4, 1]);
        assert!(!pane.move_local(0, 3));
        assert!(!pane.move_local(1, 1));
    }

    #[tokio::test]
    async fn test_local_changes_notify_subscribers() {
        let source = Arc::new(GatedSource::default());
        let pane = pane(&source);
        let mut rx = pane.subscribe();

        pane.add_local(Item::new(1));
        assert!(rx.has_changed().unwrap());
        rx.mark_unchanged();

        pane.add_local(Item::new(1));
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_filter_burst_issues_one_reset_load() {
        let source = Arc::new(GatedSource::default());
        let pane = pane(&source);
        source.respond(page(&[123], false));

        for text in ["1", "12", "123"] {
            pane.set_filter(text);
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(pane.filter_pending());
        assert!(source.queries().is_empty());

        tokio::time::sleep(Duration::from_millis(400)).await;

        let queries = source.queries();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].filter.as_deref(), Some("123"));
        assert_eq!(queries[0].page, 1);
        assert_eq!(pane.snapshot().filter.as_deref(), Some("123"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_filter_clears() {
        let source = Arc::new(GatedSource::default());
        let pane = pane(&source);
        source.respond(page(&[5], true));
        pane.load(1, Some("5".into()), true).await;
        source.respond(page(&[1, 2], true));

        pane.set_filter("   ");
        tokio::time::sleep(Duration::from_millis(400)).await;

        assert_eq!(source.queries()[1].filter, None);
        assert_eq!(pane.snapshot().filter, None);
    }

    #[tokio::test]
    async fn test_refresh_keeps_filter_and_resets_exhaustion() {
        let source = Arc::new(GatedSource::default());
        let pane = pane(&source);
        source.respond(page(&[4], false));
        pane.load(1, Some("4".into()), true).await;
        assert!(pane.snapshot().exhausted);

        source.respond(page(&[4, 14], true));
        pane.refresh().await;

        let state = pane.snapshot();
        assert_eq!(source.queries()[1].filter.as_deref(), Some("4"));
        assert!(!state.exhausted);
        assert_eq!(ids(&state), vec![4, 14]);
    }

    #[tokio::test]
    async fn test_order_tracking_adopts_reported_order_on_reset() {
        use crate::persist::MemoryOrderStore;

        let source = Arc::new(GatedSource::default());
        let order = SelectedOrder::new(Arc::new(MemoryOrderStore::new()));
        let pane = PaneManager::new(PaneKind::Selected, source.clone(), PaneSettings::default())
            .with_order_tracking(order.clone());

        source.respond(Ok(Page {
            items: vec![Item::new(3)],
            total: 3,
            page: 1,
            has_more: true,
            order: Some(vec![3, 1, 2]),
        }));
        pane.load(1, None, true).await;
        assert_eq!(order.snapshot(), vec![3, 1, 2]);

        // Appended pages do not touch the order
        source.respond(Ok(Page {
            items: vec![Item::new(1)],
            total: 3,
            page: 2,
            has_more: true,
            order: Some(vec![1]),
        }));
        pane.request_next_page().await;
        assert_eq!(order.snapshot(), vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn test_reset_response_keeps_hand_off_made_during_load() {
        use crate::persist::MemoryOrderStore;

        let source = Arc::new(GatedSource::default());
        let order = SelectedOrder::new(Arc::new(MemoryOrderStore::new()));
        let pane = Arc::new(
            PaneManager::new(PaneKind::Selected, source.clone(), PaneSettings::default())
                .with_order_tracking(order.clone()),
        );
        source.respond(Ok(Page {
            items: vec![Item::new(1), Item::new(11)],
            total: 2,
            page: 1,
            has_more: false,
            order: Some(vec![1, 11]),
        }));
        pane.load(1, None, true).await;

        let gate = source.gate();
        let reload = tokio::spawn({
            let pane = pane.clone();
            async move { pane.refresh().await }
        });
        source.wait_for_fetches(2).await;

        // Selected while the snapshot was on its way back
        pane.add_local(Item::new(15));
        order.append(15);

        gate.send(Ok(Page {
            items: vec![Item::new(1), Item::new(11)],
            total: 2,
            page: 1,
            has_more: false,
            order: Some(vec![1, 11]),
        }))
        .ok();
        assert_eq!(reload.await.unwrap(), LoadOutcome::Applied { added: 2 });

        assert_eq!(ids(&pane.snapshot()), vec![1, 11, 15]);
        assert_eq!(order.snapshot(), vec![1, 11, 15]);
    }

    #[tokio::test]
    async fn test_response_does_not_revive_item_removed_during_load() {
        let source = Arc::new(GatedSource::default());
        let pane = pane(&source);
        source.respond(page(&[1, 2, 3], true));
        pane.load(1, None, true).await;

        let gate = source.gate();
        let reload = tokio::spawn({
            let pane = pane.clone();
            async move { pane.refresh().await }
        });
        source.wait_for_fetches(2).await;
        assert!(pane.remove_local(2));

        gate.send(page(&[1, 2, 3], true)).ok();
        reload.await.unwrap();
        assert_eq!(ids(&pane.snapshot()), vec![1, 3]);
    }

    #[tokio::test]
    async fn test_next_page_steps_back_after_hand_offs() {
        let source = Arc::new(GatedSource::default());
        let pane = Arc::new(PaneManager::new(
            PaneKind::Available,
            source.clone(),
            PaneSettings {
                page_size: 2,
                ..PaneSettings::default()
            },
        ));
        source.respond(page(&[1, 2], true));
        source.respond(page(&[3, 4], true));
        pane.load(1, None, true).await;
        pane.request_next_page().await;

        // Two items left the listing [2, 4, 5, 6, 7]: 5 and 6 slid onto page 2
        pane.remove_local(1);
        pane.remove_local(3);
        source.respond(page(&[5, 6], true));
        assert_eq!(
            pane.request_next_page().await,
            LoadOutcome::Applied { added: 2 }
        );
        assert_eq!(source.queries()[2].page, 2);

        // Caught up again
        source.respond(page(&[7], false));
        pane.request_next_page().await;
        assert_eq!(source.queries()[3].page, 3);
        assert_eq!(ids(&pane.snapshot()), vec![2, 4, 5, 6, 7]);
    }

    #[test]
    fn test_next_page_arithmetic() {
        assert_eq!(next_page(0, 0, 20), 1);
        assert_eq!(next_page(3, 0, 20), 4);
        assert_eq!(next_page(3, 1, 20), 3);
        assert_eq!(next_page(3, 20, 20), 3);
        assert_eq!(next_page(3, 21, 20), 2);
        assert_eq!(next_page(1, 5, 2), 1);
    }

    #[test]
    fn test_merge_unseen_dedupes_within_incoming() {
        let mut items = vec![Item::new(1)];
        let added = merge_unseen(
            &mut items,
            vec![Item::new(2), Item::new(2), Item::new(1)],
        );
        assert_eq!(added, 1);
        assert_eq!(items, vec![Item::new(1), Item::new(2)]);
    }
}
