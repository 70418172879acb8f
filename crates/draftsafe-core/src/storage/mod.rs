//! Persistence backends for save states.
//!
//! The service talks to storage only through [`StorageAdapter`], always
//! awaiting the returned futures even when a backend completes immediately.
//!
//! - `memory` - in-process map (session scope, tests)
//! - `file` - one file per namespace with atomic writes (durable scope)
//! - `codec` - the byte layout of a [`SerializedState`]
//! - `hash` - SHA-256 helpers

mod codec;
mod file;
mod hash;
mod memory;

use std::future::Future;
use std::pin::Pin;

pub use codec::{decode_state, encode_state};
pub use file::FileStorage;
pub use hash::{compute_file_hash, hash_bytes};
pub use memory::MemoryStorage;

use crate::error::StorageResult;

/// Boxed future returned by storage backends.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Encoded [`SaveState`](crate::SaveState) bytes, see [`encode_state`].
pub type SerializedState = Vec<u8>;

/// Key-value persistence for serialized save states.
///
/// Backends are shared across documents; each document writes only under
/// its own namespace (see [`namespace_for`]).
pub trait StorageAdapter: Send + Sync {
    /// Read the state stored under `namespace`, if any.
    fn get(&self, namespace: &str) -> BoxFuture<'_, StorageResult<Option<SerializedState>>>;

    /// Replace the state stored under `namespace`.
    fn set(&self, namespace: &str, state: SerializedState) -> BoxFuture<'_, StorageResult<()>>;

    /// Delete the state stored under `namespace`. Missing entries are not an error.
    fn remove(&self, namespace: &str) -> BoxFuture<'_, StorageResult<()>>;
}

/// Storage namespace for a document key.
pub fn namespace_for(key: &str) -> String {
    format!("autosave_{key}")
}
