//! Auto-save error types.
//!
//! Caller-facing operations return [`AutoSaveError`]. Storage backends return
//! [`StorageError`], which the service logs and swallows at the storage
//! boundary so a failing backend never fails a save.

use std::path::PathBuf;
use thiserror::Error;

/// Caller-facing auto-save error.
#[derive(Debug, Error)]
pub enum AutoSaveError {
    /// The key has no active registration.
    #[error("AutoSave not registered for key: {key}")]
    NotRegistered { key: String },

    /// `restore` without a version id on a key with an empty history.
    #[error("No saved version found")]
    NoSavedVersion,

    /// `restore` with a version id that is not in the retained history.
    #[error("Version {version_id} not found for key: {key}")]
    VersionNotFound { key: String, version_id: String },

    /// Malformed registration.
    #[error("Invalid auto-save configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl AutoSaveError {
    /// Get a user-friendly message for this error.
    pub fn user_message(&self) -> String {
        match self {
            Self::NotRegistered { key } => {
                format!("The document '{}' is not being auto-saved.", key)
            }
            Self::NoSavedVersion => "There is no saved version to restore yet.".to_string(),
            Self::VersionNotFound { version_id, .. } => {
                format!(
                    "Version {} is no longer in the document history.",
                    version_id
                )
            }
            Self::InvalidConfig { reason } => {
                format!("The auto-save settings are not valid: {}", reason)
            }
        }
    }

    /// Get a suggestion for how to resolve this error.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::NotRegistered { .. } => {
                Some("Register the document before saving or restoring it.".into())
            }
            Self::NoSavedVersion => Some("Save the document at least once first.".into()),
            Self::VersionNotFound { .. } => Some(
                "Older versions are discarded once the history limit is reached. \
                 Increase max_versions to keep more."
                    .into(),
            ),
            Self::InvalidConfig { .. } => Some(
                "Use a non-empty key and positive values for interval_ms and max_versions."
                    .into(),
            ),
        }
    }
}

/// Storage backend error.
///
/// Never surfaced through `save`, `restore` or `detect_conflicts`.
#[derive(Debug, Error)]
pub enum StorageError {
    /// File I/O error.
    #[error("Failed to {operation} file: {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stored bytes are not a serialized save state.
    #[error("Invalid stored state: {reason}")]
    InvalidFormat { reason: String },

    /// Stored state was written by a newer schema.
    #[error("Stored state version {found} is not supported (maximum: {max_supported})")]
    UnsupportedVersion { found: u32, max_supported: u32 },

    /// Serialization error.
    #[error("Failed to serialize save state")]
    Serialization {
        #[source]
        source: serde_json::Error,
    },

    /// Deserialization error.
    #[error("Failed to deserialize save state")]
    Deserialization {
        #[source]
        source: serde_json::Error,
    },

    /// Atomic write failed (temp file couldn't be renamed).
    #[error("Failed to complete write to {target_path}")]
    AtomicWriteFailed {
        temp_path: PathBuf,
        target_path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A blocking storage task panicked or was cancelled.
    #[error("Storage task failed")]
    Task {
        #[source]
        source: tokio::task::JoinError,
    },

    /// Backend-specific failure.
    #[error("Storage error: {0}")]
    Backend(String),
}

/// Result type alias for auto-save operations.
pub type Result<T> = std::result::Result<T, AutoSaveError>;

/// Result type alias for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_registered_message_contains_key() {
        let err = AutoSaveError::NotRegistered {
            key: "unregistered-key".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "AutoSave not registered for key: unregistered-key"
        );
        assert!(err.user_message().contains("unregistered-key"));
    }

    #[test]
    fn test_no_saved_version_message() {
        assert_eq!(
            AutoSaveError::NoSavedVersion.to_string(),
            "No saved version found"
        );
    }

    #[test]
    fn test_every_variant_has_suggestion() {
        let errors = [
            AutoSaveError::NotRegistered { key: "a".into() },
            AutoSaveError::NoSavedVersion,
            AutoSaveError::VersionNotFound {
                key: "a".into(),
                version_id: "v".into(),
            },
            AutoSaveError::InvalidConfig {
                reason: "empty key".into(),
            },
        ];
        for err in errors {
            assert!(err.suggestion().is_some(), "{err:?}");
        }
    }
}
