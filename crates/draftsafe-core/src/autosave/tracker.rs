//! Dirty state tracking for auto-save.

use chrono::{DateTime, Utc};

use super::AutoSaveConfig;

/// Tracks unsaved changes for one document.
///
/// Timestamps come from the service clock so timed saves are deterministic
/// under a manual clock.
#[derive(Debug, Clone, Default)]
pub struct DirtyTracker {
    /// Whether there are unsaved changes.
    dirty: bool,

    /// When the most recent change was made.
    last_change: Option<DateTime<Utc>>,

    /// When the first unsaved change was made.
    /// Reset when saved.
    first_unsaved_change: Option<DateTime<Utc>>,

    /// Whether a save is currently in progress.
    saving: bool,
}

impl DirtyTracker {
    /// Create a new tracker with no unsaved changes.
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[inline]
    pub fn is_saving(&self) -> bool {
        self.saving
    }

    /// Mark the document as having unsaved changes.
    pub fn mark_dirty(&mut self, now: DateTime<Utc>) {
        self.dirty = true;
        self.last_change = Some(now);

        // Only set first_unsaved_change if this is the first change since last save
        if self.first_unsaved_change.is_none() {
            self.first_unsaved_change = Some(now);
        }
    }

    /// Clear the dirty state after a version was recorded.
    pub fn mark_saved(&mut self) {
        self.dirty = false;
        self.first_unsaved_change = None;
    }

    /// Mark that a write to storage has started.
    pub fn start_save(&mut self) {
        self.saving = true;
    }

    /// Mark that the write to storage finished, successfully or not.
    pub fn finish_save(&mut self) {
        self.saving = false;
    }

    pub fn ms_since_last_change(&self, now: DateTime<Utc>) -> Option<u64> {
        self.last_change.map(|t| elapsed_ms(t, now))
    }

    pub fn ms_since_first_unsaved(&self, now: DateTime<Utc>) -> Option<u64> {
        self.first_unsaved_change.map(|t| elapsed_ms(t, now))
    }

    /// Check if a timed save should run now.
    pub fn should_auto_save(&self, now: DateTime<Utc>, config: &AutoSaveConfig) -> bool {
        if !self.dirty || self.saving {
            return false;
        }

        match (
            self.ms_since_last_change(now),
            self.ms_since_first_unsaved(now),
        ) {
            (Some(since_last), Some(since_first)) => config.should_save(since_last, since_first),
            _ => false,
        }
    }
}

fn elapsed_ms(since: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    u64::try_from((now - since).num_milliseconds()).unwrap_or(0)
}
