//! Auto-save configuration.

use serde::{Deserialize, Serialize};

use crate::error::{AutoSaveError, Result};

/// Where a key's state is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageScope {
    /// Survives restarts.
    #[default]
    Durable,
    /// Lives as long as the session backend.
    Session,
}

/// Configuration for one auto-saved document.
///
/// Immutable for the lifetime of a registration; re-register to change it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoSaveConfig {
    /// Document identifier. Every other operation is keyed by it.
    pub key: String,

    /// Milliseconds between automatic save attempts while dirty.
    pub interval_ms: u64,

    /// Number of versions retained, newest first.
    pub max_versions: usize,

    /// Whether `detect_conflicts` runs the divergence heuristic.
    #[serde(default)]
    pub enable_conflict_resolution: bool,

    #[serde(default)]
    pub storage_scope: StorageScope,

    /// Quiet period after the last change before a timed save.
    ///
    /// Additional changes push the save back, but never past `interval_ms`
    /// since the first unsaved change.
    #[serde(default)]
    pub debounce_ms: Option<u64>,

    /// Creation-time gap above which two differing versions conflict.
    /// Defaults to `interval_ms`.
    #[serde(default)]
    pub conflict_window_ms: Option<u64>,
}

impl AutoSaveConfig {
    pub fn new(key: impl Into<String>, interval_ms: u64, max_versions: usize) -> Self {
        Self {
            key: key.into(),
            interval_ms,
            max_versions,
            enable_conflict_resolution: false,
            storage_scope: StorageScope::default(),
            debounce_ms: None,
            conflict_window_ms: None,
        }
    }

    #[must_use]
    pub fn with_conflict_resolution(mut self, enable: bool) -> Self {
        self.enable_conflict_resolution = enable;
        self
    }

    #[must_use]
    pub fn with_storage_scope(mut self, scope: StorageScope) -> Self {
        self.storage_scope = scope;
        self
    }

    #[must_use]
    pub fn with_debounce_ms(mut self, debounce_ms: u64) -> Self {
        self.debounce_ms = Some(debounce_ms);
        self
    }

    #[must_use]
    pub fn with_conflict_window_ms(mut self, window_ms: u64) -> Self {
        self.conflict_window_ms = Some(window_ms);
        self
    }

    /// Effective conflict window in milliseconds.
    pub fn conflict_window_ms(&self) -> u64 {
        self.conflict_window_ms.unwrap_or(self.interval_ms)
    }

    /// Reject configurations that cannot be registered.
    pub fn validate(&self) -> Result<()> {
        let reason = if self.key.is_empty() {
            "key must not be empty"
        } else if self.interval_ms == 0 {
            "interval_ms must be positive"
        } else if self.max_versions == 0 {
            "max_versions must be at least 1"
        } else {
            return Ok(());
        };
        Err(AutoSaveError::InvalidConfig {
            reason: reason.to_string(),
        })
    }

    /// Check if a timed save should happen given the time since the last
    /// change and since the first unsaved change.
    pub fn should_save(&self, since_last_change_ms: u64, since_first_unsaved_ms: u64) -> bool {
        let Some(debounce_ms) = self.debounce_ms else {
            return true;
        };

        // Save if debounce has passed
        if since_last_change_ms >= debounce_ms {
            return true;
        }

        // Force save if changes keep coming for a whole interval
        since_first_unsaved_ms >= self.interval_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AutoSaveConfig::new("doc", 30_000, 10);
        assert!(!config.enable_conflict_resolution);
        assert_eq!(config.storage_scope, StorageScope::Durable);
        assert_eq!(config.conflict_window_ms(), 30_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_malformed() {
        for config in [
            AutoSaveConfig::new("", 1000, 1),
            AutoSaveConfig::new("doc", 0, 1),
            AutoSaveConfig::new("doc", 1000, 0),
        ] {
            assert!(matches!(
                config.validate(),
                Err(AutoSaveError::InvalidConfig { .. })
            ));
        }
    }

    #[test]
    fn test_should_save_without_debounce() {
        let config = AutoSaveConfig::new("doc", 1000, 1);
        assert!(config.should_save(0, 0));
    }

    #[test]
    fn test_should_save_debounce() {
        let config = AutoSaveConfig::new("doc", 30_000, 1).with_debounce_ms(2000);

        // Before debounce
        assert!(!config.should_save(1000, 1000));

        // After debounce
        assert!(config.should_save(2500, 2500));
    }

    #[test]
    fn test_should_save_forced_after_interval() {
        let config = AutoSaveConfig::new("doc", 30_000, 1).with_debounce_ms(2000);

        // Rapid changes within the interval
        assert!(!config.should_save(500, 25_000));

        // Changes kept coming for a whole interval
        assert!(config.should_save(500, 35_000));
    }

    #[test]
    fn test_deserialize_with_optional_fields_omitted() {
        let config: AutoSaveConfig =
            serde_json::from_str(r#"{"key":"doc","interval_ms":5000,"max_versions":3}"#).unwrap();
        assert_eq!(config, AutoSaveConfig::new("doc", 5000, 3));

        let session: AutoSaveConfig = serde_json::from_str(
            r#"{"key":"doc","interval_ms":5000,"max_versions":3,"storage_scope":"session"}"#,
        )
        .unwrap();
        assert_eq!(session.storage_scope, StorageScope::Session);
    }
}
