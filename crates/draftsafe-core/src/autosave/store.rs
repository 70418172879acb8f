//! Bounded version history for one document.

use std::collections::VecDeque;

use crate::types::{Version, VersionId};

/// Newest-first version history holding at most `capacity` entries.
#[derive(Debug, Clone)]
pub struct VersionStore {
    versions: VecDeque<Version>,
    capacity: usize,
}

impl VersionStore {
    /// `capacity` is clamped to at least one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            versions: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Build a store from a newest-first list, keeping the `capacity` newest.
    pub fn from_versions(versions: Vec<Version>, capacity: usize) -> Self {
        let mut store = Self::new(capacity);
        store.versions.extend(versions);
        store.versions.truncate(store.capacity);
        store
    }

    /// Prepend `version` and return whatever fell off the tail.
    pub fn push(&mut self, version: Version) -> Vec<Version> {
        self.versions.push_front(version);
        let mut evicted = Vec::new();
        while self.versions.len() > self.capacity {
            if let Some(oldest) = self.versions.pop_back() {
                evicted.push(oldest);
            }
        }
        evicted
    }

    #[inline]
    pub fn latest(&self) -> Option<&Version> {
        self.versions.front()
    }

    pub fn get(&self, id: &VersionId) -> Option<&Version> {
        self.versions.iter().find(|v| &v.id == id)
    }

    pub fn is_latest(&self, id: &VersionId) -> bool {
        self.latest().is_some_and(|v| &v.id == id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &Version> {
        self.versions.iter()
    }

    /// Newest-first copy of the history.
    pub fn to_vec(&self) -> Vec<Version> {
        self.versions.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Snapshot;
    use chrono::{DateTime, Duration, Utc};
    use proptest::prelude::*;

    fn version(n: i64) -> Version {
        Version::new(
            Snapshot::from(format!("rev {n}")),
            DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(n),
        )
    }

    #[test]
    fn test_push_is_newest_first() {
        let mut store = VersionStore::new(3);
        store.push(version(1));
        store.push(version(2));

        assert_eq!(store.latest().unwrap().content, Snapshot::from("rev 2"));
        assert_eq!(store.iter().nth(1).unwrap().content, Snapshot::from("rev 1"));
    }

    #[test]
    fn test_push_evicts_oldest() {
        let mut store = VersionStore::new(5);
        let mut evicted = Vec::new();
        for n in 1..=7 {
            evicted.extend(store.push(version(n)));
        }

        assert_eq!(store.len(), 5);
        assert_eq!(evicted.len(), 2);
        let oldest_kept = store.iter().map(|v| v.created_at).min().unwrap();
        assert!(evicted.iter().all(|v| v.created_at < oldest_kept));
    }

    #[test]
    fn test_lookup_by_id() {
        let mut store = VersionStore::new(2);
        let first = version(1);
        let id = first.id.clone();
        store.push(first);
        store.push(version(2));

        assert_eq!(store.get(&id).unwrap().content, Snapshot::from("rev 1"));
        assert!(!store.is_latest(&id));

        store.push(version(3));
        assert!(store.get(&id).is_none());
    }

    #[test]
    fn test_from_versions_truncates() {
        let versions: Vec<_> = (1..=4).rev().map(version).collect();
        let store = VersionStore::from_versions(versions, 2);
        assert_eq!(store.len(), 2);
        assert_eq!(store.latest().unwrap().content, Snapshot::from("rev 4"));
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let mut store = VersionStore::new(0);
        store.push(version(1));
        assert_eq!(store.capacity(), 1);
        assert_eq!(store.len(), 1);
    }

    proptest! {
        #[test]
        fn prop_len_never_exceeds_capacity(capacity in 1usize..16, saves in 0usize..64) {
            let mut store = VersionStore::new(capacity);
            for n in 0..saves {
                store.push(version(n as i64));
                prop_assert!(store.len() <= capacity);
            }
            prop_assert_eq!(store.len(), saves.min(capacity));
        }
    }
}
