//! Observable per-document state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Version, VersionId};

/// Snapshot of a registered document's auto-save state.
///
/// `versions` is ordered newest first and never longer than the key's
/// `max_versions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveState {
    pub is_enabled: bool,
    pub has_unsaved_changes: bool,
    pub last_saved: Option<DateTime<Utc>>,
    pub versions: Vec<Version>,
}

impl SaveState {
    /// State of a freshly registered key.
    pub fn fresh() -> Self {
        Self {
            is_enabled: true,
            has_unsaved_changes: false,
            last_saved: None,
            versions: Vec::new(),
        }
    }

    #[inline]
    pub fn latest(&self) -> Option<&Version> {
        self.versions.first()
    }

    pub fn find(&self, id: &VersionId) -> Option<&Version> {
        self.versions.iter().find(|v| &v.id == id)
    }
}

impl Default for SaveState {
    fn default() -> Self {
        Self::fresh()
    }
}
