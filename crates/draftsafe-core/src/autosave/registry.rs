//! Registered documents and their mutable state.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::{AutoSaveConfig, DirtyTracker, SnapshotSource, VersionStore};
use crate::types::SaveState;

/// Everything the service knows about one registered key.
pub struct RegistryEntry {
    pub config: AutoSaveConfig,
    pub enabled: bool,
    pub tracker: DirtyTracker,
    pub last_saved: Option<DateTime<Utc>>,
    pub store: VersionStore,
    /// Bumped on every (re-)registration of the key.
    pub generation: u64,
    /// Serializes async operations on this key.
    pub lock: Arc<tokio::sync::Mutex<()>>,
    pub source: Option<Arc<dyn SnapshotSource>>,
}

impl RegistryEntry {
    /// Observable state of the entry.
    pub fn state(&self) -> SaveState {
        SaveState {
            is_enabled: self.enabled,
            has_unsaved_changes: self.tracker.is_dirty(),
            last_saved: self.last_saved,
            versions: self.store.to_vec(),
        }
    }
}

/// Key → entry map.
#[derive(Default)]
pub struct ConfigRegistry {
    entries: HashMap<String, RegistryEntry>,
    next_generation: u64,
}

impl ConfigRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a fresh entry for `config.key`, replacing any previous one.
    ///
    /// A replaced entry's lock is carried over so operations already waiting
    /// on the key run against the new state instead of being dropped.
    pub fn insert(
        &mut self,
        config: AutoSaveConfig,
        source: Option<Arc<dyn SnapshotSource>>,
    ) -> &RegistryEntry {
        self.next_generation += 1;
        let lock = self
            .entries
            .get(&config.key)
            .map(|previous| Arc::clone(&previous.lock))
            .unwrap_or_default();

        let key = config.key.clone();
        let entry = RegistryEntry {
            store: VersionStore::new(config.max_versions),
            config,
            enabled: true,
            tracker: DirtyTracker::new(),
            last_saved: None,
            generation: self.next_generation,
            lock,
            source,
        };
        self.entries.insert(key.clone(), entry);
        &self.entries[&key]
    }

    pub fn remove(&mut self, key: &str) -> Option<RegistryEntry> {
        self.entries.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&RegistryEntry> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut RegistryEntry> {
        self.entries.get_mut(key)
    }

    /// Whether `key` is still registered under `generation`.
    pub fn is_current(&self, key: &str, generation: u64) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| entry.generation == generation)
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_fresh_state() {
        let mut registry = ConfigRegistry::new();
        let state = registry
            .insert(AutoSaveConfig::new("doc", 1000, 3), None)
            .state();
        assert_eq!(state, SaveState::fresh());
    }

    #[test]
    fn test_reinsert_bumps_generation_and_keeps_lock() {
        let mut registry = ConfigRegistry::new();
        let (first_gen, first_lock) = {
            let entry = registry.insert(AutoSaveConfig::new("doc", 1000, 3), None);
            (entry.generation, Arc::clone(&entry.lock))
        };

        let entry = registry.insert(AutoSaveConfig::new("doc", 2000, 5), None);
        assert!(entry.generation > first_gen);
        assert!(Arc::ptr_eq(&entry.lock, &first_lock));
        assert_eq!(entry.store.capacity(), 5);
        assert!(!registry.is_current("doc", first_gen));
    }

    #[test]
    fn test_keys_sorted() {
        let mut registry = ConfigRegistry::new();
        registry.insert(AutoSaveConfig::new("b", 1000, 1), None);
        registry.insert(AutoSaveConfig::new("a", 1000, 1), None);
        assert_eq!(registry.keys(), vec!["a".to_string(), "b".to_string()]);

        assert!(registry.remove("a").is_some());
        assert!(registry.remove("a").is_none());
        assert_eq!(registry.len(), 1);
    }
}
