//! Persisted CLI settings.
//!
//! Settings live in `settings.toml` under the platform config directory
//! unless `--config` points elsewhere. Every field has a default, so a
//! missing file or a partial one is fine.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use draftsafe_core::{AutoSaveConfig, StorageScope};
use serde::{Deserialize, Serialize};

/// Root settings document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub store: StoreSettings,

    /// Applied to every key the CLI registers.
    pub defaults: DocumentDefaults,
}

/// Where saved state is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Store directory. Falls back to the platform data directory.
    pub dir: Option<PathBuf>,
}

/// Auto-save parameters shared by all documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentDefaults {
    pub interval_ms: u64,
    pub max_versions: usize,
    pub enable_conflict_resolution: bool,
    pub conflict_window_ms: Option<u64>,
    pub debounce_ms: Option<u64>,
}

impl Default for DocumentDefaults {
    fn default() -> Self {
        Self {
            interval_ms: 30_000,
            max_versions: 10,
            enable_conflict_resolution: true,
            conflict_window_ms: None,
            debounce_ms: None,
        }
    }
}

impl Settings {
    /// Load from `path`, or the default location when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => Self::load_from(&Self::config_path()),
        }
    }

    /// Load from a specific path. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No settings file; using defaults");
                return Ok(Self::default());
            }
            Err(error) => {
                return Err(error)
                    .with_context(|| format!("read settings from {}", path.display()));
            }
        };
        toml::from_str(&content).with_context(|| format!("parse settings in {}", path.display()))
    }

    /// Save to a specific path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create config directory {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("serialize settings")?;
        std::fs::write(path, content)
            .with_context(|| format!("write settings to {}", path.display()))
    }

    /// Default config file path.
    pub fn config_path() -> PathBuf {
        project_dirs()
            .map(|dirs| dirs.config_dir().join("settings.toml"))
            .unwrap_or_else(|| PathBuf::from("settings.toml"))
    }

    /// Store directory: `[store] dir`, else the platform data directory.
    pub fn store_dir(&self) -> PathBuf {
        self.store.dir.clone().unwrap_or_else(|| {
            project_dirs()
                .map(|dirs| dirs.data_dir().join("store"))
                .unwrap_or_else(|| PathBuf::from(".draftsafe"))
        })
    }

    /// Auto-save configuration for `key` built from the defaults.
    pub fn config_for(&self, key: &str) -> AutoSaveConfig {
        let defaults = &self.defaults;
        let mut config = AutoSaveConfig::new(key, defaults.interval_ms, defaults.max_versions)
            .with_conflict_resolution(defaults.enable_conflict_resolution)
            .with_storage_scope(StorageScope::Durable);
        if let Some(window_ms) = defaults.conflict_window_ms {
            config = config.with_conflict_window_ms(window_ms);
        }
        if let Some(debounce_ms) = defaults.debounce_ms {
            config = config.with_debounce_ms(debounce_ms);
        }
        config
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "draftsafe", "draftsafe")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let settings: Settings = toml::from_str("[defaults]\nmax_versions = 3\n").unwrap();
        assert_eq!(settings.defaults.max_versions, 3);
        assert_eq!(settings.defaults.interval_ms, 30_000);
        assert!(settings.store.dir.is_none());
    }

    #[test]
    fn test_config_for_applies_optional_defaults() {
        let mut settings = Settings::default();
        settings.defaults.conflict_window_ms = Some(5_000);
        let config = settings.config_for("draft");
        assert_eq!(config.key, "draft");
        assert_eq!(config.conflict_window_ms(), 5_000);
        assert!(config.enable_conflict_resolution);
        assert_eq!(config.debounce_ms, None);
    }

    #[test]
    fn test_store_dir_prefers_explicit_setting() {
        let mut settings = Settings::default();
        settings.store.dir = Some(PathBuf::from("/tmp/drafts"));
        assert_eq!(settings.store_dir(), PathBuf::from("/tmp/drafts"));
    }
}
