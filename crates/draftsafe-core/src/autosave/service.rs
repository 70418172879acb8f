//! The auto-save service facade.

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration as StdDuration;

use chrono::Duration;
use tokio::sync::OwnedMutexGuard;

use super::{
    AutoSaveConfig, ConfigRegistry, ListenerHandle, NotificationBus, RegistryEntry, Scheduler,
    SnapshotSource, StorageScope, TickFn, VersionStore, detect_conflicts,
};
use crate::clock::{Clock, SystemClock};
use crate::error::{AutoSaveError, Result};
use crate::storage::{
    BoxFuture, MemoryStorage, StorageAdapter, decode_state, encode_state, namespace_for,
};
use crate::types::{Conflict, SaveState, Snapshot, Version, VersionId};

/// Versioned auto-save for any number of documents.
///
/// Cloning is cheap and every clone drives the same documents. Construct one
/// at startup and call [`destroy`](Self::destroy) at shutdown.
///
/// Operations on one key are serialized; operations on different keys are
/// independent. `save`, `restore` and `detect_conflicts` fail only on caller
/// errors; storage failures are logged and never surface.
#[derive(Clone)]
pub struct AutoSaveService {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Mutex<ConfigRegistry>,
    bus: NotificationBus,
    scheduler: Scheduler,
    clock: Arc<dyn Clock>,
    durable: Arc<dyn StorageAdapter>,
    session: Arc<dyn StorageAdapter>,
}

impl Inner {
    fn registry(&self) -> MutexGuard<'_, ConfigRegistry> {
        self.registry.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn storage(&self, scope: StorageScope) -> &Arc<dyn StorageAdapter> {
        match scope {
            StorageScope::Durable => &self.durable,
            StorageScope::Session => &self.session,
        }
    }
}

impl Default for AutoSaveService {
    fn default() -> Self {
        Self::new()
    }
}

impl AutoSaveService {
    /// Service with the system clock and in-memory storage for both scopes.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> AutoSaveServiceBuilder {
        AutoSaveServiceBuilder::default()
    }

    /// Register (or re-register) a document.
    ///
    /// Re-registration resets the key to a fresh state and re-arms its timer.
    /// Without an attached [`SnapshotSource`] the timer has nothing to save;
    /// use [`register_with_source`](Self::register_with_source) for timed saves.
    pub fn register(&self, config: AutoSaveConfig) -> Result<()> {
        self.register_entry(config, None)
    }

    /// Register a document whose timer saves the content `source` provides.
    pub fn register_with_source(
        &self,
        config: AutoSaveConfig,
        source: impl SnapshotSource + 'static,
    ) -> Result<()> {
        self.register_entry(config, Some(Arc::new(source)))
    }

    fn register_entry(
        &self,
        config: AutoSaveConfig,
        source: Option<Arc<dyn SnapshotSource>>,
    ) -> Result<()> {
        config.validate()?;

        let key = config.key.clone();
        let interval_ms = config.interval_ms;
        self.inner.registry().insert(config, source);

        let armed = self.inner.scheduler.arm(
            &key,
            StdDuration::from_millis(interval_ms),
            self.tick_fn(&key),
        );
        if !armed {
            tracing::warn!(key = %key, "No async runtime; registered without an auto-save timer");
        }

        tracing::info!(key = %key, interval_ms, "Registered document for auto-save");
        Ok(())
    }

    /// Register a document, then reload its history from storage.
    ///
    /// Returns the recovered state, or `None` when storage had nothing usable
    /// for the key. Storage and decoding failures are logged and treated as
    /// an empty store.
    pub async fn recover(&self, config: AutoSaveConfig) -> Result<Option<SaveState>> {
        self.recover_entry(config, None).await
    }

    /// [`recover`](Self::recover), attaching `source` for timed saves.
    pub async fn recover_with_source(
        &self,
        config: AutoSaveConfig,
        source: impl SnapshotSource + 'static,
    ) -> Result<Option<SaveState>> {
        self.recover_entry(config, Some(Arc::new(source))).await
    }

    async fn recover_entry(
        &self,
        config: AutoSaveConfig,
        source: Option<Arc<dyn SnapshotSource>>,
    ) -> Result<Option<SaveState>> {
        let key = config.key.clone();
        let scope = config.storage_scope;
        self.register_entry(config, source)?;

        let _guard = self.acquire(&key).await?;
        let generation = self
            .inner
            .registry()
            .get(&key)
            .map(|entry| entry.generation)
            .ok_or_else(|| not_registered(&key))?;

        let stored = match self.inner.storage(scope).get(&namespace_for(&key)).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Ok(None),
            Err(error) => {
                tracing::warn!(key = %key, %error, "Failed to read persisted state");
                return Ok(None);
            }
        };

        let persisted = match decode_state(&stored) {
            Ok(state) => state,
            Err(error) => {
                tracing::warn!(key = %key, %error, "Ignoring unreadable persisted state");
                return Ok(None);
            }
        };

        let state = {
            let mut registry = self.inner.registry();
            let entry = registry
                .get_mut(&key)
                .filter(|entry| entry.generation == generation)
                .ok_or_else(|| not_registered(&key))?;
            entry.store =
                VersionStore::from_versions(persisted.versions, entry.config.max_versions);
            entry.last_saved = persisted.last_saved;
            entry.state()
        };

        tracing::info!(key = %key, versions = state.versions.len(), "Recovered persisted versions");
        self.inner.bus.notify(&key, Some(&state));
        Ok(Some(state))
    }

    /// Record a new version of `key`'s content.
    ///
    /// The version is kept in memory, listeners are notified, the timer is
    /// re-armed, and the state is then written to storage. A failed write is
    /// logged and does not fail the save. Dropping the returned future keeps
    /// the in-memory version; the write may or may not have reached storage.
    pub async fn save(&self, key: &str, content: impl Into<Snapshot>) -> Result<()> {
        let content = content.into();
        let _guard = self.acquire(key).await?;
        let now = self.inner.clock.now();

        let (state, generation, scope) = {
            let mut registry = self.inner.registry();
            let entry = registry.get_mut(key).ok_or_else(|| not_registered(key))?;

            let version = Version::new(content, now);
            let version_id = version.id.clone();
            let evicted = entry.store.push(version);
            entry.tracker.mark_saved();
            entry.tracker.start_save();
            entry.last_saved = Some(now);

            tracing::debug!(
                key,
                version = %version_id,
                retained = entry.store.len(),
                evicted = evicted.len(),
                "Saved version"
            );
            (entry.state(), entry.generation, entry.config.storage_scope)
        };

        // Clears the in-flight flag even if this future is dropped mid-write.
        let _write = WriteInFlight {
            inner: &self.inner,
            key,
            generation,
        };

        self.inner.bus.notify(key, Some(&state));
        self.inner.scheduler.reset(key);

        self.persist(key, generation, scope, &state).await;
        Ok(())
    }

    async fn persist(&self, key: &str, generation: u64, scope: StorageScope, state: &SaveState) {
        let bytes = match encode_state(state) {
            Ok(bytes) => bytes,
            Err(error) => {
                tracing::warn!(key, %error, "Failed to encode save state");
                return;
            }
        };

        if !self.inner.registry().is_current(key, generation) {
            tracing::debug!(key, "Key torn down before persisting; dropping write");
            return;
        }

        let namespace = namespace_for(key);
        if let Err(error) = self.inner.storage(scope).set(&namespace, bytes).await {
            tracing::warn!(key, %error, "Failed to persist save state; keeping in-memory version");
        }
    }

    /// Content of the newest version, or of `version_id` when given.
    ///
    /// Restoring any version other than the newest marks the document as
    /// having unsaved changes and notifies listeners. The history itself is
    /// never modified.
    pub async fn restore(&self, key: &str, version_id: Option<&VersionId>) -> Result<Snapshot> {
        let _guard = self.acquire(key).await?;
        let now = self.inner.clock.now();

        let (content, changed) = {
            let mut registry = self.inner.registry();
            let entry = registry.get_mut(key).ok_or_else(|| not_registered(key))?;

            let version = match version_id {
                None => entry.store.latest().ok_or(AutoSaveError::NoSavedVersion)?,
                Some(id) => {
                    entry
                        .store
                        .get(id)
                        .ok_or_else(|| AutoSaveError::VersionNotFound {
                            key: key.to_string(),
                            version_id: id.to_string(),
                        })?
                }
            };
            let content = version.content.clone();

            if entry.store.is_latest(&version.id) {
                (content, None)
            } else {
                tracing::debug!(key, version = %version.id, "Restored historical version");
                entry.tracker.mark_dirty(now);
                (content, Some(entry.state()))
            }
        };

        if let Some(state) = changed {
            self.inner.bus.notify(key, Some(&state));
        }
        Ok(content)
    }

    /// Flag `key` as having unsaved changes. Does nothing for unknown keys.
    pub fn mark_as_changed(&self, key: &str) {
        let state = {
            let mut registry = self.inner.registry();
            let Some(entry) = registry.get_mut(key) else {
                tracing::trace!(key, "Ignoring change for unregistered key");
                return;
            };
            entry.tracker.mark_dirty(self.inner.clock.now());
            entry.state()
        };
        self.inner.bus.notify(key, Some(&state));
    }

    /// Check the two newest versions of `key` for divergence.
    ///
    /// Always empty when conflict resolution is disabled for the key or it
    /// has fewer than two versions.
    pub async fn detect_conflicts(&self, key: &str) -> Result<Vec<Conflict>> {
        let _guard = self.acquire(key).await?;

        let registry = self.inner.registry();
        let entry = registry.get(key).ok_or_else(|| not_registered(key))?;
        if !entry.config.enable_conflict_resolution {
            return Ok(Vec::new());
        }

        let recent: Vec<Version> = entry.store.iter().take(2).cloned().collect();
        let window = i64::try_from(entry.config.conflict_window_ms())
            .ok()
            .and_then(Duration::try_milliseconds)
            .unwrap_or(Duration::MAX);
        Ok(detect_conflicts(&recent, window, self.inner.clock.now()))
    }

    /// Current state of `key`, or `None` when it is not registered.
    pub fn get_state(&self, key: &str) -> Option<SaveState> {
        self.inner.registry().get(key).map(RegistryEntry::state)
    }

    /// Call `callback` on every save, change, and teardown of `key`.
    ///
    /// The callback receives `None` when the key is unregistered or the
    /// service destroyed; it is dropped afterwards.
    pub fn add_listener(
        &self,
        key: &str,
        callback: impl Fn(Option<&SaveState>) + Send + Sync + 'static,
    ) -> ListenerHandle {
        self.inner.bus.subscribe(key, Arc::new(callback))
    }

    /// Stop tracking `key`. Unknown keys are ignored.
    ///
    /// Persisted state is left in storage; see
    /// [`clear_persisted`](Self::clear_persisted).
    pub fn unregister(&self, key: &str) {
        self.inner.scheduler.cancel(key);
        let removed = self.inner.registry().remove(key);
        if removed.is_none() {
            return;
        }

        tracing::info!(
            key,
            listeners = self.inner.bus.listener_count(key),
            "Unregistered document"
        );
        self.inner.bus.notify(key, None);
        self.inner.bus.clear(key);
    }

    /// Unregister every key. Safe to call repeatedly.
    pub fn destroy(&self) {
        let keys = self.inner.registry().keys();
        for key in &keys {
            self.unregister(key);
        }
        self.inner.scheduler.cancel_all();
        tracing::debug!(count = keys.len(), "Auto-save service destroyed");
    }

    /// Delete whatever storage holds for `key` in `scope`.
    pub async fn clear_persisted(&self, key: &str, scope: StorageScope) {
        if let Err(error) = self.inner.storage(scope).remove(&namespace_for(key)).await {
            tracing::warn!(key, %error, "Failed to remove persisted state");
        }
    }

    /// Registered keys, sorted.
    pub fn registered_keys(&self) -> Vec<String> {
        self.inner.registry().keys()
    }

    /// Whether `key` currently has a running timer.
    pub fn has_timer(&self, key: &str) -> bool {
        self.inner.scheduler.is_armed(key)
    }

    fn tick_fn(&self, key: &str) -> TickFn {
        let weak = Arc::downgrade(&self.inner);
        let key = key.to_string();
        Arc::new(move || -> BoxFuture<'static, ()> {
            let weak = Weak::clone(&weak);
            let key = key.clone();
            Box::pin(async move {
                if let Some(inner) = weak.upgrade() {
                    AutoSaveService { inner }.auto_save_tick(&key).await;
                }
            })
        })
    }

    async fn auto_save_tick(&self, key: &str) {
        let source = {
            let registry = self.inner.registry();
            let Some(entry) = registry.get(key) else {
                return;
            };
            if entry.tracker.is_saving() {
                tracing::trace!(key, "Previous write still in flight; skipping tick");
                return;
            }
            if !entry
                .tracker
                .should_auto_save(self.inner.clock.now(), &entry.config)
            {
                return;
            }
            match &entry.source {
                Some(source) => Arc::clone(source),
                None => {
                    tracing::debug!(key, "Auto-save due but no snapshot source is attached");
                    return;
                }
            }
        };

        let Some(content) = source.snapshot() else {
            tracing::debug!(key, "Snapshot source had no content; skipping timed save");
            return;
        };

        if let Err(error) = self.save(key, content).await {
            tracing::debug!(key, %error, "Timed save skipped");
        }
    }

    /// Wait for exclusive use of `key`.
    ///
    /// Fails if the key is not registered, or was unregistered while waiting.
    async fn acquire(&self, key: &str) -> Result<OwnedMutexGuard<()>> {
        let lock = self
            .inner
            .registry()
            .get(key)
            .map(|entry| Arc::clone(&entry.lock))
            .ok_or_else(|| not_registered(key))?;

        let guard = Arc::clone(&lock).lock_owned().await;

        let still_registered = self
            .inner
            .registry()
            .get(key)
            .is_some_and(|entry| Arc::ptr_eq(&entry.lock, &lock));
        if still_registered {
            Ok(guard)
        } else {
            Err(not_registered(key))
        }
    }
}

/// Marks the end of a storage write for one registration of a key.
struct WriteInFlight<'a> {
    inner: &'a Inner,
    key: &'a str,
    generation: u64,
}

impl Drop for WriteInFlight<'_> {
    fn drop(&mut self) {
        if let Some(entry) = self.inner.registry().get_mut(self.key)
            && entry.generation == self.generation
        {
            entry.tracker.finish_save();
        }
    }
}

fn not_registered(key: &str) -> AutoSaveError {
    AutoSaveError::NotRegistered {
        key: key.to_string(),
    }
}

/// Builder for [`AutoSaveService`].
///
/// Unset collaborators default to [`SystemClock`] and [`MemoryStorage`].
#[derive(Default)]
pub struct AutoSaveServiceBuilder {
    clock: Option<Arc<dyn Clock>>,
    durable: Option<Arc<dyn StorageAdapter>>,
    session: Option<Arc<dyn StorageAdapter>>,
}

impl AutoSaveServiceBuilder {
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Backend for [`StorageScope::Durable`] keys.
    #[must_use]
    pub fn durable_storage(mut self, storage: Arc<dyn StorageAdapter>) -> Self {
        self.durable = Some(storage);
        self
    }

    /// Backend for [`StorageScope::Session`] keys.
    #[must_use]
    pub fn session_storage(mut self, storage: Arc<dyn StorageAdapter>) -> Self {
        self.session = Some(storage);
        self
    }

    pub fn build(self) -> AutoSaveService {
        AutoSaveService {
            inner: Arc::new(Inner {
                registry: Mutex::new(ConfigRegistry::new()),
                bus: NotificationBus::new(),
                scheduler: Scheduler::new(),
                clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
                durable: self
                    .durable
                    .unwrap_or_else(|| Arc::new(MemoryStorage::new())),
                session: self
                    .session
                    .unwrap_or_else(|| Arc::new(MemoryStorage::new())),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_register_without_runtime_has_no_timer() {
        let service = AutoSaveService::new();
        service
            .register(AutoSaveConfig::new("doc", 1000, 3))
            .unwrap();

        assert!(!service.has_timer("doc"));
        assert_eq!(service.get_state("doc"), Some(SaveState::fresh()));
    }

    #[test]
    fn test_register_rejects_malformed_config() {
        let service = AutoSaveService::new();
        let result = service.register(AutoSaveConfig::new("", 1000, 3));
        assert!(matches!(result, Err(AutoSaveError::InvalidConfig { .. })));
        assert!(service.registered_keys().is_empty());
    }

    #[tokio::test]
    async fn test_listener_may_call_back_into_service() {
        let service = AutoSaveService::new();
        service
            .register(AutoSaveConfig::new("doc", 60_000, 3))
            .unwrap();

        let inner = service.clone();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        service.add_listener("doc", move |_state| {
            let versions = inner.get_state("doc").map_or(0, |s| s.versions.len());
            sink.lock().unwrap().push(versions);
        });

        service.save("doc", json!({"text": "a"})).await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![1]);
    }
}
