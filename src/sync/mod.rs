//! # Synchronization Core
//!
//! Keeps the two panes, the server and local storage eventually consistent.
//!
//! ## Components
//!
//! - [`PaneManager`] - one pane's loaded items, filter and pagination cursor
//! - [`Mediator`] - select/deselect, remote first then both panes
//! - [`ReorderCoordinator`] - drag reorder spliced into the full order
//! - [`SelectedOrder`] - the shared canonical order, persisted on every change
//! - [`ScrollSensor`] - "near end of list" detection that drives paging
//! - [`Workspace`] - wires all of the above together
//!
//! ## Data flow
//!
//! ```text
//!              ┌──────────────┐   pages    ┌──────────────┐
//!  sensor ───▶ │  Available   │ ◀───────── │              │
//!              │ PaneManager  │            │  CatalogApi  │
//!              └──────┬───────┘            │              │
//!                     │ Mediator ────────▶ │              │
//!              ┌──────┴───────┐   pages    │              │
//!  sensor ───▶ │   Selected   │ ◀───────── │              │
//!              │ PaneManager  │            └──────────────┘
//!              └──────┬───────┘                   ▲
//!                     │ ReorderCoordinator ───────┘
//!                     ▼
//!               SelectedOrder ──▶ OrderStore
//! ```

pub mod debounce;
pub mod mediator;
pub mod order;
pub mod pane;
pub mod reorder;
pub mod sensor;
pub mod source;
pub mod workspace;

pub use debounce::Debouncer;
pub use mediator::Mediator;
pub use order::SelectedOrder;
pub use pane::{LoadOutcome, PaneKind, PaneManager, PaneSettings, PaneState, SkipReason};
pub use reorder::{
    splice_order, FullOrderSource, IgnoreReason, ReorderCoordinator, ReorderGesture,
    ReorderOutcome,
};
pub use sensor::{ScrollSensor, Viewport};
pub use source::{CatalogSource, Page, PageSource, SelectionSource};
pub use workspace::{parse_item_id, AddItemError, MountReport, Workspace, WorkspaceSettings};
