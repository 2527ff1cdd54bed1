//! # Persistence Module
//!
//! Keeps the user's selection order across sessions.
//!
//! ## Overview
//!
//! Exactly one record is stored: the canonical order of selected item ids.
//! It is rewritten wholesale on every order mutation and read once when the
//! selected pane mounts. It is an authority over *order* only; which items
//! exist and which are selected is decided by the catalog API.
//!
//! ## Storage
//!
//! Stored in XDG-compliant locations:
//! - Linux: `~/.local/share/picker/selection.json`
//! - macOS: `~/Library/Application Support/picker/selection.json`
//! - Windows: `%APPDATA%\picker\selection.json`
//!
//! ## Data Format
//!
//! ```json
//! { "selectedOrder": [42, 7, 19] }
//! ```

mod storage;

pub use storage::{
    get_storage_dir, FileOrderStore, MemoryOrderStore, OrderStore, PersistedRecord,
    STATE_FILE_NAME,
};
