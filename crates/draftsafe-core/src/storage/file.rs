//! Durable file-backed storage.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::hash::hash_bytes;
use super::{BoxFuture, SerializedState, StorageAdapter};
use crate::error::{StorageError, StorageResult};

const STATE_EXTENSION: &str = "dsv";

/// Stores each namespace in its own file under a root directory.
///
/// File names are the SHA-256 of the namespace, so any document key maps to
/// a valid, collision-free file name. All disk work runs on tokio's blocking
/// pool.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding `namespace`.
    pub fn path_for(&self, namespace: &str) -> PathBuf {
        self.root
            .join(hash_bytes(namespace.as_bytes()))
            .with_extension(STATE_EXTENSION)
    }
}

impl StorageAdapter for FileStorage {
    fn get(&self, namespace: &str) -> BoxFuture<'_, StorageResult<Option<SerializedState>>> {
        let path = self.path_for(namespace);
        Box::pin(async move {
            tokio::task::spawn_blocking(move || read_state(&path))
                .await
                .map_err(|source| StorageError::Task { source })?
        })
    }

    fn set(&self, namespace: &str, state: SerializedState) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.path_for(namespace);
        Box::pin(async move {
            tokio::task::spawn_blocking(move || write_state_atomic(&path, &state))
                .await
                .map_err(|source| StorageError::Task { source })?
        })
    }

    fn remove(&self, namespace: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.path_for(namespace);
        Box::pin(async move {
            tokio::task::spawn_blocking(move || remove_state(&path))
                .await
                .map_err(|source| StorageError::Task { source })?
        })
    }
}

fn read_state(path: &Path) -> StorageResult<Option<SerializedState>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StorageError::Io {
            operation: "read",
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Write via temp file + rename so a crash never leaves a torn state file.
fn write_state_atomic(path: &Path, bytes: &[u8]) -> StorageResult<()> {
    let temp_path = path.with_extension("dsv.tmp");

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StorageError::Io {
            operation: "create directory",
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let mut file = File::create(&temp_path).map_err(|e| StorageError::Io {
        operation: "create",
        path: temp_path.clone(),
        source: e,
    })?;

    file.write_all(bytes).map_err(|e| StorageError::Io {
        operation: "write",
        path: temp_path.clone(),
        source: e,
    })?;

    file.sync_all().map_err(|e| StorageError::Io {
        operation: "sync",
        path: temp_path.clone(),
        source: e,
    })?;

    fs::rename(&temp_path, path).map_err(|e| StorageError::AtomicWriteFailed {
        temp_path: temp_path.clone(),
        target_path: path.to_path_buf(),
        source: e,
    })?;

    tracing::debug!("Wrote save state to {}", path.display());
    Ok(())
}

fn remove_state(path: &Path) -> StorageResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StorageError::Io {
            operation: "remove",
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_set_then_get() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("store"));

        storage.set("autosave_doc", b"payload".to_vec()).await.unwrap();

        assert!(storage.path_for("autosave_doc").exists());
        assert_eq!(
            storage.get("autosave_doc").await.unwrap(),
            Some(b"payload".to_vec())
        );
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        assert_eq!(storage.get("autosave_missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_overwrite_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        storage.set("ns", b"one".to_vec()).await.unwrap();
        storage.set("ns", b"two".to_vec()).await.unwrap();

        assert_eq!(storage.get("ns").await.unwrap(), Some(b"two".to_vec()));
        let files: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        storage.set("ns", b"x".to_vec()).await.unwrap();
        storage.remove("ns").await.unwrap();
        storage.remove("ns").await.unwrap();
        assert_eq!(storage.get("ns").await.unwrap(), None);
    }

    #[test]
    fn test_namespaces_map_to_distinct_files() {
        let storage = FileStorage::new("/tmp/store");
        assert_ne!(storage.path_for("autosave_a"), storage.path_for("autosave_b"));
        assert_eq!(
            storage.path_for("autosave_../../etc").parent(),
            Some(Path::new("/tmp/store"))
        );
    }
}
