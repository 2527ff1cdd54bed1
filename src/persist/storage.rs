//! # Order Storage
//!
//! Durable storage for the single persisted record.
//!
//! ## Storage Location
//!
//! ```text
//! ~/.local/share/picker/
//! └── selection.json
//! ```
//!
//! Reads and writes are best-effort: a missing or corrupted file reads as
//! "nothing saved", and a failed write is logged and otherwise ignored.

use crate::api::ItemId;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// File name of the persisted record inside the data directory
pub const STATE_FILE_NAME: &str = "selection.json";

/// The one durable record: the user's canonical order of selected ids
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedRecord {
    pub selected_order: Vec<ItemId>,
}

impl PersistedRecord {
    pub fn new(selected_order: Vec<ItemId>) -> Self {
        Self { selected_order }
    }

    /// Drop repeated ids, keeping the first occurrence.
    fn deduplicated(mut self) -> Self {
        let mut seen = HashSet::new();
        self.selected_order.retain(|id| seen.insert(*id));
        self
    }
}

/// Key-value persistence capability for the selection order
pub trait OrderStore: Send + Sync {
    /// Last saved record, or `None` if never saved or unreadable.
    fn get_state(&self) -> Option<PersistedRecord>;

    /// Overwrite the saved record. Never fails outward.
    fn save_state(&self, record: &PersistedRecord);
}

/// [`OrderStore`] backed by a JSON file
#[derive(Debug, Clone)]
pub struct FileOrderStore {
    path: PathBuf,
}

impl FileOrderStore {
    /// Store in the XDG data directory for this application
    pub fn new() -> Result<Self> {
        Ok(Self::at(get_storage_dir()?.join(STATE_FILE_NAME)))
    }

    /// Store at an explicit path
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, record: &PersistedRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create state directory: {}", parent.display())
            })?;
        }

        let json = serde_json::to_string(record).context("Failed to serialize selection order")?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write state file: {}", self.path.display()))?;

        Ok(())
    }
}

impl OrderStore for FileOrderStore {
    fn get_state(&self) -> Option<PersistedRecord> {
        if !self.path.exists() {
            return None;
        }
        match load_record(&self.path) {
            Ok(record) => Some(record.deduplicated()),
            Err(e) => {
                warn!("Ignoring saved selection order: {:#}", e);
                None
            }
        }
    }

    fn save_state(&self, record: &PersistedRecord) {
        match self.write(record) {
            Ok(()) => debug!(
                path = %self.path.display(),
                len = record.selected_order.len(),
                "saved selection order"
            ),
            Err(e) => warn!("Failed to save selection order: {:#}", e),
        }
    }
}

/// [`OrderStore`] that lives only as long as the process
#[derive(Debug, Default)]
pub struct MemoryOrderStore {
    record: Mutex<Option<PersistedRecord>>,
    saves: Mutex<usize>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that starts with a saved record, as after a previous session
    pub fn with_record(record: PersistedRecord) -> Self {
        Self {
            record: Mutex::new(Some(record)),
            saves: Mutex::new(0),
        }
    }

    /// Number of `save_state` calls so far
    pub fn save_count(&self) -> usize {
        self.saves.lock().map(|count| *count).unwrap_or(0)
    }
}

impl OrderStore for MemoryOrderStore {
    fn get_state(&self) -> Option<PersistedRecord> {
        self.record.lock().ok().and_then(|record| record.clone())
    }

    fn save_state(&self, record: &PersistedRecord) {
        if let Ok(mut slot) = self.record.lock() {
            *slot = Some(record.clone());
        }
        if let Ok(mut count) = self.saves.lock() {
            *count += 1;
        }
    }
}

/// Get the XDG-compliant data directory for this application
pub fn get_storage_dir() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("", "", "picker")
        .context("Failed to determine application data directory")?;

    Ok(proj_dirs.data_dir().to_path_buf())
}

fn load_record(path: &Path) -> Result<PersistedRecord> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read state file: {}", path.display()))?;

    let record: PersistedRecord = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse state file: {}", path.display()))?;

    Ok(record)
}
