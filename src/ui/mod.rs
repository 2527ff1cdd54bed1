//! # UI Module
//!
//! Terminal front-end over the synchronization core.
//!
//! ## Components
//!
//! - [`App`] - view state (focus, cursors, scroll offsets, input modes);
//!   key presses become [`Command`]s for the event loop to run
//! - [`mod@render`] - Rendering functions for drawing the TUI
//! - [`Config`] - persisted user settings
//!
//! ## Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │          Header (add-item input)                │
//! ├────────────────────────┬────────────────────────┤
//! │ Available (n/total)    │ Selected (n/total)     │
//! │ / filter               │ / filter               │
//! │   Item 1               │   Item 7               │
//! │   Item 2               │ ≡ Item 3               │
//! │   ...                  │   ...                  │
//! │   Loading…             │   All items loaded     │
//! ├────────────────────────┴────────────────────────┤
//! │ Key help                                        │
//! │ [12:00:01] status                               │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! The row after the last item is the scroll sentinel: when it comes into
//! view the pane asks for its next page.

pub mod app;
pub mod config;
pub mod render;

pub use app::{App, Command, InputMode, StatusLine};
pub use config::Config;
pub use render::render;
