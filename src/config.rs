//! Settings persistence
//!
//! The settings record is stored as one small TOML file and always
//! read/written as a whole; there is no per-field mutation path.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::models::Settings;

/// Whole-record TOML persistence for [`Settings`]
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Platform default: `<config dir>/soundcheck/settings.toml`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|dir| dir.join("soundcheck").join("settings.toml"))
            .unwrap_or_else(|| PathBuf::from("soundcheck-settings.toml"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the record, falling back to defaults when the file is
    /// missing. A present-but-unparseable file is a configuration
    /// error, not silently replaced.
    pub fn load(&self) -> Result<Settings> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "settings file missing, using defaults");
            return Ok(Settings::default());
        }

        let content = std::fs::read_to_string(&self.path)?;
        toml::from_str(&content).map_err(|e| {
            Error::Config(format!(
                "failed to parse settings file {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    /// Replace the whole record atomically (temp file + rename)
    pub fn update(&self, settings: &Settings) -> Result<()> {
        let content = toml::to_string_pretty(settings)
            .map_err(|e| Error::Config(format!("failed to serialize settings: {}", e)))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = self.path.with_extension("toml.tmp");
        std::fs::write(&tmp_path, content)?;
        std::fs::rename(&tmp_path, &self.path)?;

        tracing::debug!(path = %self.path.display(), "settings updated");
        Ok(())
    }
}
