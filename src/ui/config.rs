//! # Configuration Persistence
//!
//! Manages user configuration stored in `~/.config/picker/config.json`.
//!
//! ## Overview
//!
//! The [`Config`] struct is serialized to / deserialized from a JSON file in
//! the user's XDG config directory. Every field is optional in the file;
//! missing fields take their defaults, unknown fields are rejected.
//!
//! | Field                | Default                     |
//! |----------------------|-----------------------------|
//! | `api_url`            | `http://localhost:3001/api` |
//! | `page_size`          | `20`                        |
//! | `filter_debounce_ms` | `300`                       |
//! | `exclude_selected`   | `true`                      |
//! | `full_order_source`  | `"remote"`                  |
//! | `sensor_threshold`   | `0.1`                       |
//!
//! Command-line flags override the file for the current run.

use crate::sync::pane::{DEFAULT_FILTER_DEBOUNCE, DEFAULT_PAGE_SIZE};
use crate::sync::sensor::DEFAULT_THRESHOLD;
use crate::sync::{FullOrderSource, PaneSettings, WorkspaceSettings};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:3001/api";

/// Persisted user configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Base URL of the catalog service; `/items` is appended.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Items requested per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Quiet period before a filter edit is applied, in milliseconds.
    #[serde(default = "default_filter_debounce_ms")]
    pub filter_debounce_ms: u64,

    /// Ask the catalog endpoint to leave out already-selected ids.
    #[serde(default = "default_exclude_selected")]
    pub exclude_selected: bool,

    /// Where reorders read the full selection order from.
    #[serde(default)]
    pub full_order_source: FullOrderSource,

    /// Fraction of the sentinel row that must be on screen to load more.
    #[serde(default = "default_sensor_threshold")]
    pub sensor_threshold: f32,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_filter_debounce_ms() -> u64 {
    DEFAULT_FILTER_DEBOUNCE.as_millis() as u64
}

fn default_exclude_selected() -> bool {
    true
}

fn default_sensor_threshold() -> f32 {
    DEFAULT_THRESHOLD
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            page_size: default_page_size(),
            filter_debounce_ms: default_filter_debounce_ms(),
            exclude_selected: default_exclude_selected(),
            full_order_source: FullOrderSource::default(),
            sensor_threshold: default_sensor_threshold(),
        }
    }
}

impl Config {
    /// Load configuration from disk. Returns `Config::default()` if the file
    /// does not exist or cannot be parsed.
    pub fn load() -> Self {
        match Self::try_load() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "ignoring unreadable config");
                Self::default()
            }
        }
    }

    fn try_load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from a specific path. Returns `Config::default()` if
    /// the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Save the current configuration to the default location, returning
    /// the path written.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save the current configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Return the path to the config file.
    pub fn config_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", "picker")
            .context("Could not determine config directory")?;
        Ok(dirs.config_dir().join("config.json"))
    }

    /// Settings for the synchronization core. A zero page size is raised
    /// to one.
    pub fn workspace_settings(&self) -> WorkspaceSettings {
        WorkspaceSettings {
            pane: PaneSettings {
                page_size: self.page_size.max(1),
                filter_debounce: Duration::from_millis(self.filter_debounce_ms),
            },
            exclude_selected: self.exclude_selected,
            full_order_source: self.full_order_source,
        }
    }
}
