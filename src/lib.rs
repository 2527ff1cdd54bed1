//! Picker TUI - two-pane item selection over a remote catalog
//!
//! This library provides the synchronization core (paginated panes, the
//! cross-pane mediator, drag reordering, persisted selection order), the
//! HTTP client for the catalog service, and the terminal front-end.

pub mod api;
pub mod persist;
pub mod sync;
pub mod ui;
