//! Configuration management and validation.
//!
//! Provides the configuration structure for parsing thresholds, color
//! scale selection, validation previews and storage locations, with
//! optional loading from a TOML file.

use crate::constants::{
    DEFAULT_CELSIUS_GUARD, DEFAULT_CSV_BUCKET, DEFAULT_CSV_TABLE, DEFAULT_PREVIEW_ROWS,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Named color scale presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ScalePreset {
    /// 4 named colors with breakpoints at 28, 30, 32
    Coarse,
    /// 12 hex colors with breakpoints from 40 to 100 °F
    Fine,
}

/// Configuration for the ingestion core
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Color scale used for temperature rendering
    pub color_scale: ScalePreset,

    /// Celsius-labelled readings at or above this value are left unconverted
    pub celsius_guard: f64,

    /// Number of parsed rows included in validation previews
    pub preview_rows: usize,

    /// Directory for the local storage backend (None = platform data dir)
    pub store_dir: Option<PathBuf>,

    /// Bucket receiving raw CSV uploads
    pub csv_bucket: String,

    /// Table receiving CSV submission rows
    pub csv_table: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            color_scale: ScalePreset::Fine,
            celsius_guard: DEFAULT_CELSIUS_GUARD,
            preview_rows: DEFAULT_PREVIEW_ROWS,
            store_dir: None,
            csv_bucket: DEFAULT_CSV_BUCKET.to_string(),
            csv_table: DEFAULT_CSV_TABLE.to_string(),
        }
    }
}

impl IngestConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::io(
                format!("Failed to read configuration file {}", path.display()),
                e,
            )
        })?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load from the given file if present, otherwise use defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Check invariants that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if !self.celsius_guard.is_finite() {
            return Err(Error::configuration("celsius_guard must be a finite number"));
        }
        if self.preview_rows == 0 {
            return Err(Error::configuration("preview_rows must be at least 1"));
        }
        if self.csv_bucket.trim().is_empty() || self.csv_table.trim().is_empty() {
            return Err(Error::configuration(
                "csv_bucket and csv_table must not be empty",
            ));
        }
        Ok(())
    }

    /// Resolve the local store directory, falling back to the platform data dir
    pub fn resolve_store_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.store_dir {
            return Ok(dir.clone());
        }
        dirs::data_dir()
            .map(|dir| dir.join("heat-ingest").join("store"))
            .ok_or_else(|| Error::configuration("Could not determine user data directory"))
    }

    /// Use a specific color scale
    pub fn with_color_scale(mut self, scale: ScalePreset) -> Self {
        self.color_scale = scale;
        self
    }

    /// Set the Celsius guard threshold
    pub fn with_celsius_guard(mut self, guard: f64) -> Self {
        self.celsius_guard = guard;
        self
    }

    /// Set the number of preview rows
    pub fn with_preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = rows;
        self
    }

    /// Use a specific local store directory
    pub fn with_store_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.store_dir = Some(dir.into());
        self
    }
}
