//! In-memory storage backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{BoxFuture, SerializedState, StorageAdapter};
use crate::error::StorageResult;

/// Storage that lives as long as the value (and its clones).
///
/// Used for session-scoped documents and in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, SerializedState>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, namespace: &str) -> bool {
        self.lock().contains_key(namespace)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, SerializedState>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl StorageAdapter for MemoryStorage {
    fn get(&self, namespace: &str) -> BoxFuture<'_, StorageResult<Option<SerializedState>>> {
        let value = self.lock().get(namespace).cloned();
        Box::pin(async move { Ok(value) })
    }

    fn set(&self, namespace: &str, state: SerializedState) -> BoxFuture<'_, StorageResult<()>> {
        self.lock().insert(namespace.to_string(), state);
        Box::pin(async { Ok(()) })
    }

    fn remove(&self, namespace: &str) -> BoxFuture<'_, StorageResult<()>> {
        self.lock().remove(namespace);
        Box::pin(async { Ok(()) })
    }
}
