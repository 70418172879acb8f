//! Versioned auto-save and conflict detection for editable documents.
//!
//! A single [`AutoSaveService`] tracks any number of documents, each
//! registered under a key. For every key it keeps a bounded newest-first
//! history of snapshots, a dirty flag, and a timer that saves periodically
//! while there are unsaved changes. Saves are persisted best-effort through
//! a [`StorageAdapter`]; in-memory state is authoritative for the session.
//!
//! # Example
//!
//! ```ignore
//! use draftsafe_core::{AutoSaveConfig, AutoSaveService};
//! use serde_json::json;
//!
//! let service = AutoSaveService::new();
//! service.register(AutoSaveConfig::new("test-editor", 30_000, 10))?;
//!
//! service.save("test-editor", json!({"text": "Test content"})).await?;
//! let content = service.restore("test-editor", None).await?;
//!
//! service.destroy();
//! ```
//!
//! # Architecture
//!
//! - `autosave/` - service facade, registry, version store, scheduler,
//!   notifications, conflict heuristic
//! - `storage/` - storage trait, memory and file backends, state codec
//! - `types/` - snapshots, versions, save states, conflicts
//! - `clock.rs` - injectable time source
//! - `error.rs` - error types with user-friendly messages

mod autosave;
mod clock;
mod error;
pub mod storage;
mod types;

// Re-export main types
pub use autosave::{
    AutoSaveConfig, AutoSaveService, AutoSaveServiceBuilder, ConfigRegistry, DirtyTracker,
    Listener, ListenerHandle, NotificationBus, RegistryEntry, Scheduler, SnapshotSource,
    StorageScope, TickFn, VersionStore, detect_conflicts,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{AutoSaveError, Result, StorageError, StorageResult};
pub use storage::{FileStorage, MemoryStorage, StorageAdapter};
pub use types::{
    CURRENT_SCHEMA_VERSION, Conflict, MAGIC_BYTES, SaveState, Snapshot, Version, VersionId,
};
