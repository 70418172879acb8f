//! Auto-save machinery.
//!
//! Provides:
//! - `AutoSaveService` - the facade callers talk to
//! - `AutoSaveConfig` - per-document registration settings
//! - `DirtyTracker` - unsaved-change tracking with optional debounce
//! - `VersionStore` - bounded newest-first history
//! - `ConfigRegistry` - registered keys and their state
//! - `Scheduler` - per-key timers
//! - `NotificationBus` - per-key listeners
//! - `detect_conflicts` - divergence heuristic

mod config;
mod conflict;
mod notify;
mod registry;
mod scheduler;
mod service;
mod source;
mod store;
mod tracker;

pub use config::{AutoSaveConfig, StorageScope};
pub use conflict::detect_conflicts;
pub use notify::{Listener, ListenerHandle, NotificationBus};
pub use registry::{ConfigRegistry, RegistryEntry};
pub use scheduler::{Scheduler, TickFn};
pub use service::{AutoSaveService, AutoSaveServiceBuilder};
pub use source::SnapshotSource;
pub use store::VersionStore;
pub use tracker::DirtyTracker;
