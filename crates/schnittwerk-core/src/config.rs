// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchnittwerkError};
use crate::geometry::{BoundsPolicy, Dpi};
use crate::paths::PathStyle;
use crate::types::OutputLayout;

/// Default config file looked up in the working directory.
pub const CONFIG_FILE: &str = "schnittwerk.json";

/// Run settings shared by both pipelines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite database holding the scan catalogue and field geometry.
    pub database_path: PathBuf,
    /// Directory receiving timestamped run logs.
    pub log_dir: PathBuf,
    /// Root directory for crop output.
    pub output_dir: PathBuf,
    /// Name of the quarantine directory, created under `output_dir`.
    pub quarantine_dir_name: String,
    /// Hierarchical or flat crop layout.
    pub output_layout: OutputLayout,
    /// Only select fields whose crop path is still unset.
    pub only_pending: bool,
    /// Re-extract fields whose recorded crop already exists on disk.
    /// Only consulted when `only_pending` is false.
    pub reprocess_existing: bool,
    /// Policy for rectangles that overhang the page.
    pub bounds_policy: BoundsPolicy,
    /// Resolution used when a scan carries no DPI metadata.
    pub default_dpi: Dpi,
    /// Separator convention for destination paths.
    pub path_style: PathStyle,
    /// Log progress every this many records.
    pub progress_interval: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("schnittwerk.db"),
            log_dir: PathBuf::from("logs"),
            output_dir: PathBuf::from("recortes"),
            quarantine_dir_name: "errores".into(),
            output_layout: OutputLayout::Hierarchical,
            only_pending: true,
            reprocess_existing: false,
            bounds_policy: BoundsPolicy::Clamp,
            default_dpi: Dpi::default(),
            path_style: PathStyle::native(),
            progress_interval: 10,
        }
    }
}

impl AppConfig {
    /// Load settings from a JSON file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Persist settings as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_dpi.x == 0 || self.default_dpi.y == 0 {
            return Err(SchnittwerkError::Config(
                "default_dpi must be positive on both axes".into(),
            ));
        }
        if self.progress_interval == 0 {
            return Err(SchnittwerkError::Config(
                "progress_interval must be at least 1".into(),
            ));
        }
        if self.quarantine_dir_name.trim().is_empty() {
            return Err(SchnittwerkError::Config(
                "quarantine_dir_name must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Directory holding quarantined source images and error notes.
    pub fn quarantine_dir(&self) -> PathBuf {
        self.output_dir.join(&self.quarantine_dir_name)
    }
}
